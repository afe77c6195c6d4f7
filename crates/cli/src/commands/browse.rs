use bloom_core::catalog::{Catalog, CatalogQuery, FilterState, SortDirective};
use bloom_core::domain::product::Product;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::commands::{store_error, to_data, with_stores, CommandResult};

#[derive(Debug, Clone, Default, Args)]
pub struct BrowseArgs {
    #[arg(long, default_value = "", help = "Case-insensitive text matched against name, brand and type")]
    pub search: String,
    #[arg(long = "type", help = "Exact product type")]
    pub product_type: Option<String>,
    #[arg(long, help = "Exact brand")]
    pub brand: Option<String>,
    #[arg(long, help = "Price bucket: low (under 25), medium (25 to under 50) or high (50 and up)")]
    pub price: Option<String>,
    #[arg(
        long,
        help = "Category view (new, popular, bestReviewed, sustainable, cheapest, premium); overrides --sort"
    )]
    pub category: Option<String>,
    #[arg(long, help = "newest, oldest, price_asc, price_desc, brand or type")]
    pub sort: Option<String>,
}

pub fn run(args: BrowseArgs) -> CommandResult {
    with_stores("browse", |config, stores| async move {
        let (products, reviews) = stores.catalog_view().await.map_err(store_error("browse"))?;
        let catalog = Catalog::new(products);

        let filters = FilterState::from_raw(
            args.product_type.as_deref(),
            args.brand.as_deref(),
            args.price.as_deref(),
            args.category.as_deref(),
        );
        let sort = args
            .sort
            .as_deref()
            .map(SortDirective::parse_lenient)
            .unwrap_or(config.catalog.default_sort);
        let request =
            CatalogQuery::new().with_search(args.search).with_filters(filters).with_sort(sort);

        let shown = catalog.query(&request, &reviews);
        debug!(
            event_name = "catalog.browse",
            total = catalog.products().len(),
            shown = shown.len(),
            sort = sort.as_str(),
            category = ?request.filters.category,
            "catalogue query evaluated"
        );

        let message = format!("{} of {} products", shown.len(), catalog.products().len());
        let data = to_data(BrowseView {
            query: &request,
            brands: catalog.brands(),
            types: catalog.product_types(),
            products: &shown,
        })?;
        Ok(CommandResult::success_with_data("browse", message, data))
    })
}

#[derive(Serialize)]
struct BrowseView<'a> {
    query: &'a CatalogQuery,
    brands: Vec<&'a str>,
    types: Vec<&'a str>,
    products: &'a [Product],
}

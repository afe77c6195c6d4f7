use std::collections::BTreeSet;

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use tracing::info;

use bloom_core::domain::product::{Marker, Product, ProductId, ProductPatch};
use bloom_core::errors::{ApplicationError, DomainError};

use crate::commands::{store_error, to_data, with_stores, CommandResult, Failure};

#[derive(Debug, Clone, Subcommand)]
pub enum ProductCommand {
    #[command(about = "List every product in store order")]
    List,
    #[command(about = "Add a product to the catalogue")]
    Add(AddProductArgs),
    #[command(about = "Change fields of an existing product")]
    Update(UpdateProductArgs),
    #[command(about = "Remove a product from the catalogue")]
    Delete { id: String },
}

#[derive(Debug, Clone, Args)]
pub struct AddProductArgs {
    #[arg(long, help = "Identifier; generated when omitted")]
    pub id: Option<String>,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub price: Decimal,
    #[arg(long, default_value = "")]
    pub brand: String,
    #[arg(long = "type", default_value = "")]
    pub product_type: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value = "")]
    pub image: String,
    #[arg(long = "marker")]
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct UpdateProductArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price: Option<Decimal>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long = "type")]
    pub product_type: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long = "marker", help = "Replaces the product's markers (repeatable)")]
    pub markers: Vec<String>,
    #[arg(long, help = "Drop every sustainability marker")]
    pub clear_markers: bool,
}

impl UpdateProductArgs {
    pub fn patch(&self) -> Result<ProductPatch, DomainError> {
        let markers = if self.clear_markers {
            Some(BTreeSet::new())
        } else if self.markers.is_empty() {
            None
        } else {
            Some(parse_markers(&self.markers)?)
        };

        Ok(ProductPatch {
            name: self.name.clone(),
            price: self.price,
            brand: self.brand.clone(),
            product_type: self.product_type.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            markers,
            ..ProductPatch::default()
        })
    }
}

fn parse_markers(raw: &[String]) -> Result<BTreeSet<Marker>, DomainError> {
    raw.iter().map(|marker| marker.parse::<Marker>()).collect()
}

fn domain_failure(error: DomainError) -> Failure {
    Failure::from_application("product", ApplicationError::Domain(error))
}

pub fn run(command: ProductCommand) -> CommandResult {
    match command {
        ProductCommand::List => list(),
        ProductCommand::Add(args) => add(args),
        ProductCommand::Update(args) => update(args),
        ProductCommand::Delete { id } => delete(id),
    }
}

fn list() -> CommandResult {
    with_stores("product", |_config, stores| async move {
        let products = stores.products.list().await.map_err(store_error("product"))?;
        Ok(CommandResult::success_with_data(
            "product",
            format!("{} products", products.len()),
            to_data(&products)?,
        ))
    })
}

fn add(args: AddProductArgs) -> CommandResult {
    with_stores("product", |_config, stores| async move {
        let markers = parse_markers(&args.markers).map_err(domain_failure)?;
        let mut product = Product::new(args.id.unwrap_or_default(), args.name, args.price)
            .with_brand(args.brand)
            .with_type(args.product_type)
            .with_markers(markers);
        product.description = args.description;
        product.image = args.image;

        let product = stores.products.create(product).await.map_err(store_error("product"))?;
        info!(event_name = "product.created", product_id = %product.id, "product added");
        Ok(CommandResult::success_with_data(
            "product",
            format!("added `{}` as `{}`", product.name, product.id),
            to_data(&product)?,
        ))
    })
}

fn update(args: UpdateProductArgs) -> CommandResult {
    with_stores("product", |_config, stores| async move {
        let patch = args.patch().map_err(domain_failure)?;
        if patch.is_empty() {
            return Err(Failure::new("bad_request", "nothing to update", 6));
        }

        let id = ProductId(args.id);
        let product = stores.products.update(&id, patch).await.map_err(store_error("product"))?;
        info!(event_name = "product.updated", product_id = %id, "product updated");
        Ok(CommandResult::success_with_data(
            "product",
            format!("updated `{id}`"),
            to_data(&product)?,
        ))
    })
}

fn delete(id: String) -> CommandResult {
    with_stores("product", |_config, stores| async move {
        let id = ProductId(id);
        stores.products.delete(&id).await.map_err(store_error("product"))?;
        info!(event_name = "product.deleted", product_id = %id, "product removed");
        Ok(CommandResult::success("product", format!("deleted `{id}`")))
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use bloom_core::domain::product::Marker;

    use super::UpdateProductArgs;

    #[test]
    fn patch_carries_only_given_fields() {
        let args = UpdateProductArgs {
            id: "p1".into(),
            price: Some(Decimal::new(1250, 2)),
            markers: vec!["recyclable".into()],
            ..UpdateProductArgs::default()
        };

        let patch = args.patch().expect("patch");

        assert_eq!(patch.price, Some(Decimal::new(1250, 2)));
        assert_eq!(patch.name, None);
        assert_eq!(patch.markers, Some([Marker::Recyclable].into_iter().collect()));
    }

    #[test]
    fn clearing_markers_wins_over_listed_markers() {
        let args = UpdateProductArgs {
            id: "p1".into(),
            markers: vec!["crueltyFree".into()],
            clear_markers: true,
            ..UpdateProductArgs::default()
        };

        assert_eq!(args.patch().expect("patch").markers, Some(Default::default()));
    }

    #[test]
    fn empty_update_is_detected() {
        let args = UpdateProductArgs { id: "p1".into(), ..UpdateProductArgs::default() };

        assert!(args.patch().expect("patch").is_empty());
    }
}

//! Catalogue query engine: search, discrete filters and ordering over a
//! product collection supplied by the caller.

pub mod filters;
pub mod ordering;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};
use crate::domain::review::ReviewIndex;

pub use filters::{Category, FilterState, PriceBucket, SortDirective};

/// Everything the storefront view feeds into one catalogue query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub search: String,
    pub filters: FilterState,
    pub sort: SortDirective,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = sort;
        self
    }
}

#[derive(Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    pub fn query(&self, request: &CatalogQuery, reviews: &ReviewIndex) -> Vec<Product> {
        query(&self.products, &request.search, &request.filters, request.sort, reviews)
    }

    /// Distinct brands in first-seen order, for the brand picker.
    pub fn brands(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|product| product.brand.as_str()))
    }

    /// Distinct product types in first-seen order, for the type picker.
    pub fn product_types(&self) -> Vec<&str> {
        distinct(self.products.iter().map(|product| product.product_type.as_str()))
    }
}

/// Runs the search, filter and ordering stages in sequence and returns the
/// products to display. Inputs are left untouched and identical inputs give
/// identical output.
pub fn query(
    products: &[Product],
    search: &str,
    filters: &FilterState,
    sort: SortDirective,
    reviews: &ReviewIndex,
) -> Vec<Product> {
    let needle = search.to_lowercase();
    let mut view: Vec<&Product> = products
        .iter()
        .filter(|product| matches_search(product, &needle))
        .filter(|product| matches_filters(product, filters))
        .collect();

    match filters.category {
        Some(category) => ordering::by_category(&mut view, category, reviews),
        None => ordering::by_directive(&mut view, sort),
    }

    view.into_iter().cloned().collect()
}

fn matches_search(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack =
        format!("{} {} {}", product.name, product.brand, product.product_type).to_lowercase();
    haystack.contains(needle)
}

fn matches_filters(product: &Product, filters: &FilterState) -> bool {
    if let Some(product_type) = &filters.product_type {
        if &product.product_type != product_type {
            return false;
        }
    }
    if let Some(brand) = &filters.brand {
        if &product.brand != brand {
            return false;
        }
    }
    if let Some(bucket) = filters.price {
        if !bucket.contains(product.price) {
            return false;
        }
    }
    true
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|value| !value.is_empty() && seen.insert(*value)).collect()
}

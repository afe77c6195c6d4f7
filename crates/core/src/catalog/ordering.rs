//! Ordering rules for the catalogue view. Every comparator here feeds a stable
//! sort, so products with equal keys keep the order the store returned.

use std::cmp::Ordering;

use crate::catalog::filters::{Category, SortDirective};
use crate::domain::product::Product;
use crate::domain::review::ReviewIndex;

pub fn by_category(products: &mut [&Product], category: Category, reviews: &ReviewIndex) {
    match category {
        Category::Popular => products.sort_by(|a, b| b.popularity.cmp(&a.popularity)),
        Category::New => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        Category::BestReviewed => products.sort_by(|a, b| {
            effective_rating(b, reviews).total_cmp(&effective_rating(a, reviews))
        }),
        Category::Sustainable => products.sort_by(|a, b| b.markers.len().cmp(&a.markers.len())),
        Category::Cheapest => products.sort_by(|a, b| a.price.cmp(&b.price)),
        Category::Premium => products.sort_by(|a, b| b.price.cmp(&a.price)),
    }
}

pub fn by_directive(products: &mut [&Product], sort: SortDirective) {
    match sort {
        SortDirective::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortDirective::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortDirective::Brand => products.sort_by(|a, b| collate(&a.brand, &b.brand)),
        SortDirective::Type => products.sort_by(|a, b| collate(&a.product_type, &b.product_type)),
        SortDirective::Oldest => products.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortDirective::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Average of the indexed reviews, or the catalogue rating when a product has
/// none.
pub fn effective_rating(product: &Product, reviews: &ReviewIndex) -> f64 {
    reviews.average_rating(&product.id).unwrap_or(product.rating)
}

/// Case-folded comparison so "aveda" and "Aveda" sort together.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase))
}

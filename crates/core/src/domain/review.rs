use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lenient;
use crate::domain::product::ProductId;
use crate::domain::user::UserId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub product_id: ProductId,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    pub author_id: UserId,
    #[serde(default = "epoch", deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Review {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(DomainError::InvariantViolation(format!(
                "review rating {} for `{}` must be within 0..=5",
                self.rating, self.product_id
            )));
        }
        Ok(())
    }
}

/// Reviews grouped by product, loaded once by the caller and read by the
/// `bestReviewed` ordering.
#[derive(Clone, Debug, Default)]
pub struct ReviewIndex {
    by_product: HashMap<ProductId, Vec<Review>>,
}

impl ReviewIndex {
    pub fn new(reviews: impl IntoIterator<Item = Review>) -> Self {
        let mut by_product: HashMap<ProductId, Vec<Review>> = HashMap::new();
        for review in reviews {
            by_product.entry(review.product_id.clone()).or_default().push(review);
        }
        Self { by_product }
    }

    pub fn for_product(&self, product_id: &ProductId) -> &[Review] {
        self.by_product.get(product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn average_rating(&self, product_id: &ProductId) -> Option<f64> {
        let reviews = self.for_product(product_id);
        if reviews.is_empty() {
            return None;
        }
        let total: f64 = reviews.iter().map(|review| review.rating).sum();
        Some(total / reviews.len() as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.by_product.is_empty()
    }
}

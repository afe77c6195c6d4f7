use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::lenient;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Sustainability tag from the fixed storefront vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Marker {
    SustainablePackaging,
    OrganicIngredients,
    Recyclable,
    CrueltyFree,
}

impl Marker {
    pub const ALL: [Marker; 4] =
        [Self::SustainablePackaging, Self::OrganicIngredients, Self::Recyclable, Self::CrueltyFree];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SustainablePackaging => "sustainablePackaging",
            Self::OrganicIngredients => "organicIngredients",
            Self::Recyclable => "recyclable",
            Self::CrueltyFree => "crueltyFree",
        }
    }
}

impl FromStr for Marker {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|marker| marker.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| DomainError::InvalidProduct(format!("unknown marker `{value}`")))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: Decimal,
    #[serde(default)]
    pub brand: String,
    #[serde(default, rename = "type")]
    pub product_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "lenient::markers")]
    pub markers: BTreeSet<Marker>,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: f64,
    #[serde(default, deserialize_with = "lenient::count_u32")]
    pub reviews: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub popularity: u64,
    #[serde(default = "epoch", deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: ProductId(id.into()),
            name: name.into(),
            price,
            brand: String::new(),
            product_type: String::new(),
            description: String::new(),
            image: String::new(),
            markers: BTreeSet::new(),
            rating: 0.0,
            reviews: 0,
            popularity: 0,
            created_at: epoch(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = product_type.into();
        self
    }

    pub fn with_markers(mut self, markers: impl IntoIterator<Item = Marker>) -> Self {
        self.markers = markers.into_iter().collect();
        self
    }

    pub fn with_popularity(mut self, popularity: u64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::InvalidProduct("product id must not be blank".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidProduct(format!(
                "product `{}` must have a name",
                self.id
            )));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::InvalidProduct(format!(
                "product `{}` has a negative price",
                self.id
            )));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(DomainError::InvalidProduct(format!(
                "product `{}` rating must be within 0..=5",
                self.id
            )));
        }
        Ok(())
    }

    /// Applies an admin edit. The id never changes.
    pub fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(product_type) = patch.product_type {
            self.product_type = product_type;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(markers) = patch.markers {
            self.markers = markers;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(reviews) = patch.reviews {
            self.reviews = reviews;
        }
        if let Some(popularity) = patch.popularity {
            self.popularity = popularity;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub markers: Option<BTreeSet<Marker>>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub popularity: Option<u64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Marker, Product, ProductPatch};
    use crate::errors::DomainError;

    #[test]
    fn patch_leaves_id_and_unset_fields_alone() {
        let mut product = Product::new("p1", "Rose Shampoo", Decimal::new(1800, 2))
            .with_brand("Petal")
            .with_popularity(3);

        product.apply_patch(ProductPatch {
            price: Some(Decimal::new(2000, 2)),
            popularity: Some(4),
            ..ProductPatch::default()
        });

        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.brand, "Petal");
        assert_eq!(product.price, Decimal::new(2000, 2));
        assert_eq!(product.popularity, 4);
    }

    #[test]
    fn validation_rejects_negative_price() {
        let product = Product::new("p1", "Rose Shampoo", Decimal::new(-1, 0));
        assert!(matches!(product.validate(), Err(DomainError::InvalidProduct(_))));
    }

    #[test]
    fn marker_names_parse_case_insensitively() {
        assert_eq!("CrueltyFree".parse::<Marker>().ok(), Some(Marker::CrueltyFree));
        assert!("vegan".parse::<Marker>().is_err());
    }

    #[test]
    fn product_serializes_type_and_created_at_in_camel_case() {
        let product = Product::new("p1", "Rose Shampoo", Decimal::new(18, 0)).with_type("shampoo");
        let json = serde_json::to_value(&product).expect("serialize");

        assert_eq!(json["type"], "shampoo");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
        assert!(!ProductPatch { name: Some("x".into()), ..ProductPatch::default() }.is_empty());
    }
}

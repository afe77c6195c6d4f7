use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

const MEDIUM_FLOOR: i64 = 25;
const HIGH_FLOOR: i64 = 50;

/// Price band offered by the storefront filter. Lower bounds are inclusive,
/// so 25 is medium and 50 is high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBucket {
    Low,
    Medium,
    High,
}

impl PriceBucket {
    pub fn of(price: Decimal) -> Self {
        if price >= Decimal::from(HIGH_FLOOR) {
            Self::High
        } else if price >= Decimal::from(MEDIUM_FLOOR) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn contains(self, price: Decimal) -> bool {
        Self::of(price) == self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for PriceBucket {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::InvalidFilter(format!(
                "unknown price bucket `{other}` (expected low|medium|high)"
            ))),
        }
    }
}

/// Named composite ordering. When one is active it replaces the sort directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    New,
    Popular,
    BestReviewed,
    Sustainable,
    Cheapest,
    Premium,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Popular => "popular",
            Self::BestReviewed => "bestReviewed",
            Self::Sustainable => "sustainable",
            Self::Cheapest => "cheapest",
            Self::Premium => "premium",
        }
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "popular" => Ok(Self::Popular),
            "bestreviewed" | "best_reviewed" => Ok(Self::BestReviewed),
            "sustainable" => Ok(Self::Sustainable),
            "cheapest" => Ok(Self::Cheapest),
            "premium" => Ok(Self::Premium),
            other => Err(DomainError::InvalidFilter(format!("unknown category `{other}`"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirective {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Brand,
    Type,
}

impl SortDirective {
    /// Unknown directives sort newest first.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Brand => "brand",
            Self::Type => "type",
        }
    }
}

impl FromStr for SortDirective {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "brand" => Ok(Self::Brand),
            "type" => Ok(Self::Type),
            other => Err(DomainError::InvalidFilter(format!(
                "unknown sort `{other}` (expected newest|oldest|price_asc|price_desc|brand|type)"
            ))),
        }
    }
}

impl fmt::Display for SortDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub product_type: Option<String>,
    pub brand: Option<String>,
    pub price: Option<PriceBucket>,
    pub category: Option<Category>,
}

impl FilterState {
    /// Builds filters from raw picker values. Blank and unrecognised values
    /// mean "no filter".
    pub fn from_raw(
        product_type: Option<&str>,
        brand: Option<&str>,
        price: Option<&str>,
        category: Option<&str>,
    ) -> Self {
        Self {
            product_type: non_blank(product_type),
            brand: non_blank(brand),
            price: price.and_then(|value| value.parse().ok()),
            category: category.and_then(|value| value.parse().ok()),
        }
    }

    pub fn with_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price(mut self, price: PriceBucket) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percent,
    Fixed,
}

impl std::str::FromStr for CouponKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "percent" => Ok(Self::Percent),
            "fixed" => Ok(Self::Fixed),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown coupon kind `{other}` (expected percent|fixed)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub kind: CouponKind,
    pub value: Decimal,
    #[serde(default)]
    pub min_subtotal: Decimal,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

impl Coupon {
    /// Coupon codes are matched without regard to case.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.trim().is_empty() {
            return Err(DomainError::InvariantViolation("coupon code must not be blank".into()));
        }
        if self.value < Decimal::ZERO || self.min_subtotal < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "coupon `{}` amounts must not be negative",
                self.code
            )));
        }
        if self.kind == CouponKind::Percent && self.value > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvariantViolation(format!(
                "coupon `{}` cannot take more than 100%",
                self.code
            )));
        }
        Ok(())
    }

    pub fn discount_for(&self, subtotal: Decimal) -> Result<Decimal, DomainError> {
        if !self.active {
            return Err(DomainError::CouponRejected {
                code: self.code.clone(),
                reason: "coupon is no longer active".to_string(),
            });
        }
        if subtotal < self.min_subtotal {
            return Err(DomainError::CouponRejected {
                code: self.code.clone(),
                reason: format!("requires a subtotal of at least {}", self.min_subtotal),
            });
        }

        let discount = match self.kind {
            CouponKind::Percent => (subtotal * self.value / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            CouponKind::Fixed => self.value.min(subtotal),
        };
        Ok(discount)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Adds `quantity` units, merging into an existing line for the product.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvariantViolation(format!(
                "cannot add zero units of `{}`",
                product.id
            )));
        }

        match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Setting a quantity of zero removes the line.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.lines.iter_mut().find(|line| &line.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn totals(&self, coupon: Option<&Coupon>) -> Result<CartTotals, DomainError> {
        let subtotal = self.subtotal();
        let discount = match coupon {
            Some(coupon) => coupon.discount_for(subtotal)?,
            None => Decimal::ZERO,
        };

        Ok(CartTotals {
            subtotal,
            discount,
            total: subtotal - discount,
            coupon: coupon.map(|coupon| coupon.code.clone()),
        })
    }
}

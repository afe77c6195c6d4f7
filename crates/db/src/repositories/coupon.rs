use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;

use bloom_core::cart::{Coupon, CouponKind};

use super::{prepare_coupon, CouponRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCouponRepository {
    pool: DbPool,
}

impl SqlCouponRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn kind_as_str(kind: CouponKind) -> &'static str {
    match kind {
        CouponKind::Percent => "percent",
        CouponKind::Fixed => "fixed",
    }
}

fn parse_amount(raw: &str, column: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw.trim())
        .map_err(|e| RepositoryError::Decode(format!("coupon {column} `{raw}`: {e}")))
}

fn row_to_coupon(row: &sqlx::sqlite::SqliteRow) -> Result<Coupon, RepositoryError> {
    let code: String = row.try_get("code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let kind: String = row.try_get("kind").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let value: String = row.try_get("value").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let min_subtotal: String =
        row.try_get("min_subtotal").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let active: bool = row.try_get("active").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Coupon {
        code,
        kind: CouponKind::from_str(&kind).map_err(|e| RepositoryError::Decode(e.to_string()))?,
        value: parse_amount(&value, "value")?,
        min_subtotal: parse_amount(&min_subtotal, "min_subtotal")?,
        active,
    })
}

#[async_trait::async_trait]
impl CouponRepository for SqlCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query(
            "SELECT code, kind, value, min_subtotal, active FROM coupons WHERE code = ?",
        )
        .bind(Coupon::normalize_code(code))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_coupon(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, coupon: Coupon) -> Result<(), RepositoryError> {
        let coupon = prepare_coupon(coupon)?;

        sqlx::query(
            "INSERT INTO coupons (code, kind, value, min_subtotal, active)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(code) DO UPDATE SET
                 kind = excluded.kind,
                 value = excluded.value,
                 min_subtotal = excluded.min_subtotal,
                 active = excluded.active",
        )
        .bind(&coupon.code)
        .bind(kind_as_str(coupon.kind))
        .bind(coupon.value.to_string())
        .bind(coupon.min_subtotal.to_string())
        .bind(coupon.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use bloom_core::domain::lenient::{clamp_rating, parse_timestamp};
use bloom_core::domain::product::{Marker, Product, ProductId, ProductPatch};

use super::{patched, prepare_new, ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, name, price, brand, product_type, description, image,
     markers_json, rating, review_count, popularity, created_at";

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn markers_to_json(markers: &BTreeSet<Marker>) -> Result<String, RepositoryError> {
    let names: Vec<&str> = markers.iter().map(|marker| marker.as_str()).collect();
    Ok(serde_json::to_string(&names)?)
}

fn markers_from_json(raw: &str) -> BTreeSet<Marker> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| Marker::from_str(name).ok())
        .collect()
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = decode(row, "id")?;
    let price: String = decode(row, "price")?;
    let markers_json: String = decode(row, "markers_json")?;
    let rating: f64 = decode(row, "rating")?;
    let review_count: i64 = decode(row, "review_count")?;
    let popularity: i64 = decode(row, "popularity")?;
    let created_at: String = decode(row, "created_at")?;

    Ok(Product {
        id: ProductId(id),
        name: decode(row, "name")?,
        price: Decimal::from_str(price.trim()).unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
        brand: decode(row, "brand")?,
        product_type: decode(row, "product_type")?,
        description: decode(row, "description")?,
        image: decode(row, "image")?,
        markers: markers_from_json(&markers_json),
        rating: clamp_rating(rating),
        reviews: u32::try_from(review_count).unwrap_or(0),
        popularity: u64::try_from(popularity).unwrap_or(0),
        created_at: parse_timestamp(&created_at).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY seq ASC"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_product).collect::<Result<Vec<_>, _>>()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        let product = prepare_new(product)?;
        let markers_json = markers_to_json(&product.markers)?;

        let result = sqlx::query(
            "INSERT INTO products (id, name, price, brand, product_type, description, image,
                                   markers_json, rating, review_count, popularity, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(product.price.to_string())
        .bind(&product.brand)
        .bind(&product.product_type)
        .bind(&product.description)
        .bind(&product.image)
        .bind(&markers_json)
        .bind(product.rating)
        .bind(i64::from(product.reviews))
        .bind(i64::try_from(product.popularity).unwrap_or(i64::MAX))
        .bind(product.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product),
            Err(error) if is_unique_violation(&error) => Err(RepositoryError::Conflict(format!(
                "product `{}` already exists",
                product.id
            ))),
            Err(error) => Err(error.into()),
        }
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product `{id}`")))?;
        let product = patched(row_to_product(&row)?, patch)?;
        let markers_json = markers_to_json(&product.markers)?;

        sqlx::query(
            "UPDATE products SET
                 name = ?, price = ?, brand = ?, product_type = ?, description = ?, image = ?,
                 markers_json = ?, rating = ?, review_count = ?, popularity = ?
             WHERE id = ?",
        )
        .bind(&product.name)
        .bind(product.price.to_string())
        .bind(&product.brand)
        .bind(&product.product_type)
        .bind(&product.description)
        .bind(&product.image)
        .bind(&markers_json)
        .bind(product.rating)
        .bind(i64::from(product.reviews))
        .bind(i64::try_from(product.popularity).unwrap_or(i64::MAX))
        .bind(&id.0)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(product)
    }

    async fn record_cart_add(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE products SET popularity = popularity + 1 WHERE id = ?")
            .bind(&id.0)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product `{id}`")));
        }

        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
            .bind(&id.0)
            .fetch_one(&mut *tx)
            .await?;
        let product = row_to_product(&row)?;

        tx.commit().await?;
        Ok(product)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM products WHERE id = ?").bind(&id.0).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product `{id}`")));
        }
        Ok(())
    }
}

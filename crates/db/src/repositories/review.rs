use chrono::{DateTime, Utc};
use sqlx::Row;

use bloom_core::domain::lenient::{clamp_rating, parse_timestamp};
use bloom_core::domain::product::ProductId;
use bloom_core::domain::review::Review;
use bloom_core::domain::user::UserId;

use super::{RepositoryError, ReviewRepository};
use crate::DbPool;

pub struct SqlReviewRepository {
    pool: DbPool,
}

impl SqlReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_review(row: &sqlx::sqlite::SqliteRow) -> Result<Review, RepositoryError> {
    let product_id: String =
        row.try_get("product_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rating: f64 = row.try_get("rating").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let comment: String =
        row.try_get("comment").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let author_id: String =
        row.try_get("author_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Review {
        product_id: ProductId(product_id),
        rating: clamp_rating(rating),
        comment,
        author_id: UserId(author_id),
        created_at: parse_timestamp(&created_at).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

#[async_trait::async_trait]
impl ReviewRepository for SqlReviewRepository {
    async fn all(&self) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT product_id, rating, comment, author_id, created_at
             FROM reviews ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_review).collect::<Result<Vec<_>, _>>()
    }

    async fn for_product(&self, product_id: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT product_id, rating, comment, author_id, created_at
             FROM reviews WHERE product_id = ? ORDER BY seq ASC",
        )
        .bind(&product_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_review).collect::<Result<Vec<_>, _>>()
    }

    async fn add(&self, review: Review) -> Result<(), RepositoryError> {
        review.validate()?;

        sqlx::query(
            "INSERT INTO reviews (product_id, rating, comment, author_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&review.product_id.0)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(&review.author_id.0)
        .bind(review.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

use chrono::Utc;

use bloom_core::domain::preferences::PreferenceProfile;
use bloom_core::domain::user::UserId;

use super::{PreferenceRepository, RepositoryError};
use crate::DbPool;

/// Profiles are stored as one JSON column per user.
pub struct SqlPreferenceRepository {
    pool: DbPool,
}

impl SqlPreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for SqlPreferenceRepository {
    async fn get(&self, user: &UserId) -> Result<Option<PreferenceProfile>, RepositoryError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT profile_json FROM preferences WHERE user_id = ?")
                .bind(&user.0)
                .fetch_optional(&self.pool)
                .await?;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| RepositoryError::Decode(format!("profile for `{user}`: {e}"))),
            None => Ok(None),
        }
    }

    async fn set(&self, user: &UserId, profile: PreferenceProfile) -> Result<(), RepositoryError> {
        let profile_json = serde_json::to_string(&profile)?;

        sqlx::query(
            "INSERT INTO preferences (user_id, profile_json, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 profile_json = excluded.profile_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&user.0)
        .bind(&profile_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

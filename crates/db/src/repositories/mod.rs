use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use bloom_core::cart::Coupon;
use bloom_core::domain::preferences::PreferenceProfile;
use bloom_core::domain::product::{Product, ProductId, ProductPatch};
use bloom_core::domain::review::{Review, ReviewIndex};
use bloom_core::domain::user::UserId;
use bloom_core::errors::{ApplicationError, DomainError};

pub mod coupon;
pub mod json_file;
pub mod memory;
pub mod preference;
pub mod product;
pub mod review;

pub use coupon::SqlCouponRepository;
pub use json_file::JsonFileStore;
pub use memory::{
    InMemoryCouponRepository, InMemoryPreferenceRepository, InMemoryProductRepository,
    InMemoryReviewRepository,
};
pub use preference::SqlPreferenceRepository;
pub use product::SqlProductRepository;
pub use review::SqlReviewRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Domain(error) => Self::Domain(error),
            RepositoryError::NotFound(message) => Self::NotFound(message),
            RepositoryError::Conflict(message) => {
                Self::Domain(DomainError::InvalidProduct(message))
            }
            other => Self::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Every product, in insertion order.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Stores a new product. A blank id is replaced by a generated one; an id
    /// that is already taken is a conflict.
    async fn create(&self, product: Product) -> Result<Product, RepositoryError>;

    async fn update(&self, id: &ProductId, patch: ProductPatch)
        -> Result<Product, RepositoryError>;

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError>;

    /// Bumps popularity by one for an add-to-cart event. Adapters override
    /// this so the increment happens under a single lock or statement.
    async fn record_cart_add(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let product = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product `{id}`")))?;
        let patch = ProductPatch {
            popularity: Some(product.popularity.saturating_add(1)),
            ..ProductPatch::default()
        };
        self.update(id, patch).await
    }
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn all(&self) -> Result<Vec<Review>, RepositoryError>;

    async fn for_product(&self, product_id: &ProductId) -> Result<Vec<Review>, RepositoryError>;

    async fn add(&self, review: Review) -> Result<(), RepositoryError>;

    async fn index(&self) -> Result<ReviewIndex, RepositoryError> {
        Ok(ReviewIndex::new(self.all().await?))
    }
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get(&self, user: &UserId) -> Result<Option<PreferenceProfile>, RepositoryError>;

    /// Replaces the stored profile wholesale.
    async fn set(&self, user: &UserId, profile: PreferenceProfile) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Codes match regardless of case and surrounding whitespace.
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;

    async fn save(&self, coupon: Coupon) -> Result<(), RepositoryError>;
}

/// Fills in what a caller may leave out of a new product: the id and, when
/// no creation time was given, the current time.
pub(crate) fn prepare_new(mut product: Product) -> Result<Product, RepositoryError> {
    if product.id.as_str().trim().is_empty() {
        product.id = ProductId::generate();
    }
    if product.created_at == DateTime::<Utc>::UNIX_EPOCH {
        product.created_at = Utc::now();
    }
    product.validate()?;
    Ok(product)
}

pub(crate) fn patched(mut product: Product, patch: ProductPatch) -> Result<Product, RepositoryError> {
    product.apply_patch(patch);
    product.validate()?;
    Ok(product)
}

pub(crate) fn prepare_coupon(mut coupon: Coupon) -> Result<Coupon, RepositoryError> {
    coupon.code = Coupon::normalize_code(&coupon.code);
    coupon.validate()?;
    Ok(coupon)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;

    use bloom_core::domain::product::{Product, ProductPatch};
    use bloom_core::errors::{ApplicationError, DomainError};

    use super::{patched, prepare_new, RepositoryError};

    #[test]
    fn blank_id_gets_generated() {
        let product = prepare_new(Product::new("  ", "Clay Mask", Decimal::new(22, 0)))
            .expect("valid product");

        assert!(!product.id.as_str().trim().is_empty());
    }

    #[test]
    fn missing_creation_time_is_stamped() {
        let before = Utc::now();
        let fresh = prepare_new(Product::new("p1", "Clay Mask", Decimal::new(22, 0)))
            .expect("valid product");
        let dated = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let imported = prepare_new(
            Product::new("p2", "Clay Mask", Decimal::new(22, 0)).with_created_at(dated),
        )
        .expect("valid product");

        assert_ne!(fresh.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(fresh.created_at >= before);
        assert_eq!(imported.created_at, dated);
    }

    #[test]
    fn patch_that_breaks_validation_is_refused() {
        let product = Product::new("p1", "Clay Mask", Decimal::new(22, 0));
        let patch = ProductPatch { price: Some(Decimal::new(-1, 0)), ..ProductPatch::default() };

        assert!(matches!(patched(product, patch), Err(RepositoryError::Domain(_))));
    }

    #[test]
    fn repository_errors_map_into_application_errors() {
        let not_found = ApplicationError::from(RepositoryError::NotFound("product `x`".into()));
        let domain = ApplicationError::from(RepositoryError::Domain(
            DomainError::InvalidProduct("bad".into()),
        ));
        let io = ApplicationError::from(RepositoryError::Io(std::io::Error::other("disk full")));

        assert!(matches!(not_found, ApplicationError::NotFound(_)));
        assert!(matches!(domain, ApplicationError::Domain(_)));
        assert!(matches!(io, ApplicationError::Persistence(ref message) if message.contains("disk full")));
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use bloom_core::config::{StorageBackend, StorageConfig};
use bloom_core::domain::product::{Product, ProductId, ProductPatch};
use bloom_core::domain::review::ReviewIndex;

use crate::repositories::{
    CouponRepository, InMemoryCouponRepository, InMemoryPreferenceRepository,
    InMemoryProductRepository, InMemoryReviewRepository, JsonFileStore, PreferenceRepository,
    ProductRepository, RepositoryError, ReviewRepository, SqlCouponRepository,
    SqlPreferenceRepository, SqlProductRepository, SqlReviewRepository,
};
use crate::{connection, migrations, DbPool};

/// The four stores of one backend, shared behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub backend: StorageBackend,
    pub products: Arc<dyn ProductRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pool: Option<DbPool>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            products: Arc::new(InMemoryProductRepository::default()),
            reviews: Arc::new(InMemoryReviewRepository::default()),
            preferences: Arc::new(InMemoryPreferenceRepository::default()),
            coupons: Arc::new(InMemoryCouponRepository::default()),
            pool: None,
        }
    }

    pub async fn json_file(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let store = Arc::new(JsonFileStore::open(path).await?);
        Ok(Self {
            backend: StorageBackend::JsonFile,
            products: store.clone(),
            reviews: store.clone(),
            preferences: store.clone(),
            coupons: store,
            pool: None,
        })
    }

    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            products: Arc::new(SqlProductRepository::new(pool.clone())),
            reviews: Arc::new(SqlReviewRepository::new(pool.clone())),
            preferences: Arc::new(SqlPreferenceRepository::new(pool.clone())),
            coupons: Arc::new(SqlCouponRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn pool(&self) -> Option<&DbPool> {
        self.pool.as_ref()
    }

    /// Products in store order together with the review index, the two
    /// inputs of a catalogue query.
    pub async fn catalog_view(&self) -> Result<(Vec<Product>, ReviewIndex), RepositoryError> {
        let products = self.products.list().await?;
        let reviews = self.reviews.index().await?;
        Ok((products, reviews))
    }

    /// Recomputes a product's rating and review count from the review store.
    pub async fn refresh_review_summary(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let reviews = self.reviews.for_product(id).await?;
        let mut patch = ProductPatch {
            reviews: Some(u32::try_from(reviews.len()).unwrap_or(u32::MAX)),
            ..ProductPatch::default()
        };
        if !reviews.is_empty() {
            let total: f64 = reviews.iter().map(|review| review.rating).sum();
            let average = total / reviews.len() as f64;
            patch.rating = Some((average * 10.0).round() / 10.0);
        }
        self.products.update(id, patch).await
    }
}

/// Opens the backend named by `storage.backend`. SQLite schemas are brought up
/// to date before the stores are handed out.
pub async fn open_stores(storage: &StorageConfig) -> Result<Stores, RepositoryError> {
    let stores = match storage.backend {
        StorageBackend::Memory => Stores::in_memory(),
        StorageBackend::JsonFile => Stores::json_file(storage.json_path.clone()).await?,
        StorageBackend::Sqlite => {
            let pool = connection::connect_for(storage).await?;
            migrations::run_pending(&pool).await?;
            Stores::sqlite(pool)
        }
    };

    info!(
        event_name = "storage.opened",
        backend = storage.backend.as_str(),
        "stores ready"
    );
    Ok(stores)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use bloom_core::config::{StorageBackend, StorageConfig};
    use bloom_core::domain::product::{Product, ProductId};

    use super::open_stores;

    fn storage(backend: StorageBackend, json_path: PathBuf) -> StorageConfig {
        StorageConfig {
            backend,
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 30,
            json_path,
        }
    }

    #[tokio::test]
    async fn every_backend_opens_and_lists_in_insertion_order() {
        let dir = TempDir::new().expect("tempdir");

        for backend in [StorageBackend::Memory, StorageBackend::JsonFile, StorageBackend::Sqlite] {
            let config = storage(backend, dir.path().join(format!("{}.json", backend.as_str())));
            let stores = open_stores(&config).await.expect("open stores");
            assert_eq!(stores.backend, backend);

            for id in ["second", "first", "third"] {
                stores
                    .products
                    .create(Product::new(id, id, Decimal::new(10, 0)))
                    .await
                    .expect("create");
            }

            let (products, reviews) = stores.catalog_view().await.expect("catalog view");
            let ids: Vec<&str> = products.iter().map(|product| product.id.as_str()).collect();
            assert_eq!(ids, vec!["second", "first", "third"], "{backend:?}");
            assert!(reviews.is_empty());
            assert_eq!(stores.pool().is_some(), backend == StorageBackend::Sqlite);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_cart_adds_are_all_counted() {
        let dir = TempDir::new().expect("tempdir");

        for backend in [StorageBackend::Memory, StorageBackend::JsonFile, StorageBackend::Sqlite] {
            let config = storage(backend, dir.path().join(format!("{}.json", backend.as_str())));
            let stores = open_stores(&config).await.expect("open stores");
            stores
                .products
                .create(Product::new("p1", "Clay Mask", Decimal::new(22, 0)))
                .await
                .expect("create");

            let tasks: Vec<_> = (0..16)
                .map(|_| {
                    let products = stores.products.clone();
                    tokio::spawn(async move {
                        products.record_cart_add(&ProductId::from("p1")).await.map(|_| ())
                    })
                })
                .collect();
            for task in tasks {
                task.await.expect("task joined").expect("cart add");
            }

            let product = stores
                .products
                .find_by_id(&ProductId::from("p1"))
                .await
                .expect("find")
                .expect("present");
            assert_eq!(product.popularity, 16, "{backend:?}");
            assert!(stores.products.record_cart_add(&ProductId::from("ghost")).await.is_err());
        }
    }

    #[tokio::test]
    async fn unreachable_sqlite_is_an_error() {
        let config = StorageConfig {
            database_url: "sqlite:///nonexistent-dir/deeper/bloom.db".to_string(),
            ..storage(StorageBackend::Sqlite, PathBuf::new())
        };

        assert!(open_stores(&config).await.is_err());
    }
}

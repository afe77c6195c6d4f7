//! Local persistent store: the whole catalogue in one JSON document, read on
//! open and rewritten after every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use bloom_core::cart::Coupon;
use bloom_core::domain::preferences::PreferenceProfile;
use bloom_core::domain::product::{Product, ProductId, ProductPatch};
use bloom_core::domain::review::Review;
use bloom_core::domain::user::UserId;

use super::memory::{
    bump_popularity, find_coupon, insert_product, remove_product, update_product, upsert_coupon,
};
use super::{
    CouponRepository, PreferenceRepository, ProductRepository, RepositoryError, ReviewRepository,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
    pub preferences: BTreeMap<String, PreferenceProfile>,
    pub coupons: Vec<Coupon>,
}

pub struct JsonFileStore {
    path: PathBuf,
    document: RwLock<CatalogDocument>,
}

impl JsonFileStore {
    /// Reads the document at `path`. A missing file is an empty catalogue and
    /// is created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => CatalogDocument::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                CatalogDocument::default()
            }
            Err(error) => return Err(error.into()),
        };

        info!(
            event_name = "storage.json_file.opened",
            path = %path.display(),
            products = document.products.len(),
            reviews = document.reviews.len(),
            "json catalogue loaded"
        );
        Ok(Self { path, document: RwLock::new(document) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> CatalogDocument {
        self.document.read().await.clone()
    }

    /// Applies `change` and persists the document when it succeeds. A failed
    /// change leaves both memory and disk untouched.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut CatalogDocument) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut document = self.document.write().await;
        let mut draft = document.clone();
        let value = change(&mut draft)?;
        self.persist(&draft).await?;
        *document = draft;
        Ok(value)
    }

    async fn persist(&self, document: &CatalogDocument) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(document)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!(
            event_name = "storage.json_file.persisted",
            path = %self.path.display(),
            bytes = bytes.len(),
            "json catalogue written"
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductRepository for JsonFileStore {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.document.read().await.products.clone())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let document = self.document.read().await;
        Ok(document.products.iter().find(|product| &product.id == id).cloned())
    }

    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        self.mutate(|document| insert_product(&mut document.products, product)).await
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        self.mutate(|document| update_product(&mut document.products, id, patch)).await
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.mutate(|document| remove_product(&mut document.products, id)).await
    }

    async fn record_cart_add(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.mutate(|document| bump_popularity(&mut document.products, id)).await
    }
}

#[async_trait::async_trait]
impl ReviewRepository for JsonFileStore {
    async fn all(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.document.read().await.reviews.clone())
    }

    async fn for_product(&self, product_id: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        let document = self.document.read().await;
        Ok(document
            .reviews
            .iter()
            .filter(|review| &review.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn add(&self, review: Review) -> Result<(), RepositoryError> {
        review.validate()?;
        self.mutate(|document| {
            document.reviews.push(review);
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl PreferenceRepository for JsonFileStore {
    async fn get(&self, user: &UserId) -> Result<Option<PreferenceProfile>, RepositoryError> {
        Ok(self.document.read().await.preferences.get(&user.0).cloned())
    }

    async fn set(&self, user: &UserId, profile: PreferenceProfile) -> Result<(), RepositoryError> {
        self.mutate(|document| {
            document.preferences.insert(user.0.clone(), profile);
            Ok(())
        })
        .await
    }
}

#[async_trait::async_trait]
impl CouponRepository for JsonFileStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        Ok(find_coupon(&self.document.read().await.coupons, code))
    }

    async fn save(&self, coupon: Coupon) -> Result<(), RepositoryError> {
        self.mutate(|document| upsert_coupon(&mut document.coupons, coupon)).await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use bloom_core::domain::preferences::PreferenceProfile;
    use bloom_core::domain::product::{Marker, Product, ProductId};
    use bloom_core::domain::user::UserId;

    use super::JsonFileStore;
    use crate::repositories::{PreferenceRepository, ProductRepository, RepositoryError};

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = JsonFileStore::open(dir.path().join("absent.json")).await.expect("open");

        assert!(store.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen_in_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nested").join("bloom.json");

        let store = JsonFileStore::open(&path).await.expect("open");
        for id in ["z", "m", "a"] {
            store
                .create(
                    Product::new(id, format!("Soap {id}"), Decimal::new(1200, 2))
                        .with_markers([Marker::Recyclable]),
                )
                .await
                .expect("create");
        }
        store
            .set(&UserId::from("u1"), PreferenceProfile::default())
            .await
            .expect("set preferences");
        store.record_cart_add(&ProductId::from("m")).await.expect("cart add");

        let reopened = JsonFileStore::open(&path).await.expect("reopen");
        let products = reopened.list().await.expect("list");

        let ids: Vec<&str> = products.iter().map(|product| product.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
        assert_eq!(products[1].popularity, 1);
        assert_eq!(products[0].price, Decimal::new(1200, 2));
        assert!(reopened.get(&UserId::from("u1")).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn failed_mutation_does_not_touch_disk() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bloom.json");
        let store = JsonFileStore::open(&path).await.expect("open");
        store.create(Product::new("p1", "Soap", Decimal::ONE)).await.expect("create");

        let duplicate = store.create(Product::new("p1", "Other", Decimal::ONE)).await;
        assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

        let reopened = JsonFileStore::open(&path).await.expect("reopen");
        let products = reopened.list().await.expect("list");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Soap");
    }

    #[tokio::test]
    async fn malformed_fields_load_with_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{"products":[{"id":"old","name":"Old Balm","price":"n/a","rating":9,
                "markers":{"crueltyFree":true,"recyclable":false},"createdAt":"garbage"}]}"#,
        )
        .expect("write legacy document");

        let store = JsonFileStore::open(&path).await.expect("open");
        let product =
            store.find_by_id(&ProductId::from("old")).await.expect("find").expect("present");

        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.rating, 5.0);
        assert_eq!(product.markers.len(), 1);
        assert_eq!(product.created_at.timestamp(), 0);
    }

    #[tokio::test]
    async fn unreadable_document_is_a_serialization_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").expect("write");

        let result = JsonFileStore::open(&path).await;

        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }
}

use std::collections::HashMap;

use tokio::sync::RwLock;

use bloom_core::cart::Coupon;
use bloom_core::domain::preferences::PreferenceProfile;
use bloom_core::domain::product::{Product, ProductId, ProductPatch};
use bloom_core::domain::review::Review;
use bloom_core::domain::user::UserId;

use super::{
    patched, prepare_coupon, prepare_new, CouponRepository, PreferenceRepository,
    ProductRepository, RepositoryError, ReviewRepository,
};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.products.read().await.clone())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn create(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        insert_product(&mut products, product)
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        update_product(&mut products, id, patch)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        remove_product(&mut products, id)
    }

    async fn record_cart_add(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let mut products = self.products.write().await;
        bump_popularity(&mut products, id)
    }
}

#[derive(Default)]
pub struct InMemoryReviewRepository {
    reviews: RwLock<Vec<Review>>,
}

#[async_trait::async_trait]
impl ReviewRepository for InMemoryReviewRepository {
    async fn all(&self) -> Result<Vec<Review>, RepositoryError> {
        Ok(self.reviews.read().await.clone())
    }

    async fn for_product(&self, product_id: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().filter(|review| &review.product_id == product_id).cloned().collect())
    }

    async fn add(&self, review: Review) -> Result<(), RepositoryError> {
        review.validate()?;
        self.reviews.write().await.push(review);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPreferenceRepository {
    profiles: RwLock<HashMap<UserId, PreferenceProfile>>,
}

#[async_trait::async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn get(&self, user: &UserId) -> Result<Option<PreferenceProfile>, RepositoryError> {
        Ok(self.profiles.read().await.get(user).cloned())
    }

    async fn set(&self, user: &UserId, profile: PreferenceProfile) -> Result<(), RepositoryError> {
        self.profiles.write().await.insert(user.clone(), profile);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCouponRepository {
    coupons: RwLock<Vec<Coupon>>,
}

#[async_trait::async_trait]
impl CouponRepository for InMemoryCouponRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupons = self.coupons.read().await;
        Ok(find_coupon(&coupons, code))
    }

    async fn save(&self, coupon: Coupon) -> Result<(), RepositoryError> {
        let mut coupons = self.coupons.write().await;
        upsert_coupon(&mut coupons, coupon)
    }
}

pub(crate) fn insert_product(
    products: &mut Vec<Product>,
    product: Product,
) -> Result<Product, RepositoryError> {
    let product = prepare_new(product)?;
    if products.iter().any(|existing| existing.id == product.id) {
        return Err(RepositoryError::Conflict(format!("product `{}` already exists", product.id)));
    }
    products.push(product.clone());
    Ok(product)
}

pub(crate) fn update_product(
    products: &mut [Product],
    id: &ProductId,
    patch: ProductPatch,
) -> Result<Product, RepositoryError> {
    let slot = products
        .iter_mut()
        .find(|product| &product.id == id)
        .ok_or_else(|| RepositoryError::NotFound(format!("product `{id}`")))?;
    let updated = patched(slot.clone(), patch)?;
    *slot = updated.clone();
    Ok(updated)
}

pub(crate) fn bump_popularity(
    products: &mut [Product],
    id: &ProductId,
) -> Result<Product, RepositoryError> {
    let slot = products
        .iter_mut()
        .find(|product| &product.id == id)
        .ok_or_else(|| RepositoryError::NotFound(format!("product `{id}`")))?;
    slot.popularity = slot.popularity.saturating_add(1);
    Ok(slot.clone())
}

pub(crate) fn remove_product(
    products: &mut Vec<Product>,
    id: &ProductId,
) -> Result<(), RepositoryError> {
    let before = products.len();
    products.retain(|product| &product.id != id);
    if products.len() == before {
        return Err(RepositoryError::NotFound(format!("product `{id}`")));
    }
    Ok(())
}

pub(crate) fn find_coupon(coupons: &[Coupon], code: &str) -> Option<Coupon> {
    let code = Coupon::normalize_code(code);
    coupons.iter().find(|coupon| Coupon::normalize_code(&coupon.code) == code).cloned()
}

pub(crate) fn upsert_coupon(coupons: &mut Vec<Coupon>, coupon: Coupon) -> Result<(), RepositoryError> {
    let coupon = prepare_coupon(coupon)?;
    match coupons.iter_mut().find(|existing| Coupon::normalize_code(&existing.code) == coupon.code)
    {
        Some(existing) => *existing = coupon,
        None => coupons.push(coupon),
    }
    Ok(())
}

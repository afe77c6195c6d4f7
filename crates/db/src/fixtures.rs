use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use bloom_core::cart::{Coupon, CouponKind};
use bloom_core::domain::lenient::parse_timestamp;
use bloom_core::domain::product::{Marker, Product, ProductId};
use bloom_core::domain::review::Review;
use bloom_core::domain::user::UserId;

use crate::repositories::RepositoryError;
use crate::stores::Stores;

use bloom_core::domain::product::Marker::{
    CrueltyFree, OrganicIngredients, Recyclable, SustainablePackaging,
};

/// Deterministic demo catalogue covering every price bucket and marker.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        id: "bloom-001",
        name: "Rosewater Hydrating Shampoo",
        price_cents: 1800,
        brand: "Petal & Stem",
        product_type: "shampoo",
        description: "Gentle daily shampoo with rosewater and oat protein.",
        markers: &[OrganicIngredients, CrueltyFree],
        popularity: 42,
        created_at: "2024-01-12",
    },
    SeedProduct {
        id: "bloom-002",
        name: "Cedar Body Wash",
        price_cents: 2500,
        brand: "Moss Apothecary",
        product_type: "body wash",
        description: "Woody, low-foam wash in a refillable aluminium bottle.",
        markers: &[Recyclable, SustainablePackaging],
        popularity: 31,
        created_at: "2024-02-03",
    },
    SeedProduct {
        id: "bloom-003",
        name: "Overnight Repair Cream",
        price_cents: 6400,
        brand: "Aveline",
        product_type: "night cream",
        description: "Rich ceramide cream for dry skin.",
        markers: &[CrueltyFree],
        popularity: 18,
        created_at: "2024-02-20",
    },
    SeedProduct {
        id: "bloom-004",
        name: "Clarifying Acne Cleanser",
        price_cents: 2200,
        brand: "Clearleaf",
        product_type: "acne cleanser",
        description: "Salicylic acid gel cleanser for oily and acne-prone skin.",
        markers: &[CrueltyFree, Recyclable],
        popularity: 57,
        created_at: "2024-03-08",
    },
    SeedProduct {
        id: "bloom-005",
        name: "Lavender Hand Lotion",
        price_cents: 1400,
        brand: "Petal & Stem",
        product_type: "lotion",
        description: "Fast-absorbing lotion with lavender oil.",
        markers: &[OrganicIngredients],
        popularity: 12,
        created_at: "2024-03-21",
    },
    SeedProduct {
        id: "bloom-006",
        name: "Vitamin C Brightening Serum",
        price_cents: 4900,
        brand: "Aveline",
        product_type: "serum",
        description: "Stabilised vitamin C serum in a UV-safe glass dropper.",
        markers: &[CrueltyFree, Recyclable, SustainablePackaging],
        popularity: 64,
        created_at: "2024-04-02",
    },
    SeedProduct {
        id: "bloom-007",
        name: "Argan Repair Hair Oil",
        price_cents: 3200,
        brand: "Moss Apothecary",
        product_type: "hair oil",
        description: "Lightweight argan and jojoba blend for frizz.",
        markers: &[OrganicIngredients, SustainablePackaging],
        popularity: 23,
        created_at: "2024-04-19",
    },
    SeedProduct {
        id: "bloom-008",
        name: "Solid Conditioner Bar",
        price_cents: 1600,
        brand: "Clearleaf",
        product_type: "conditioner",
        description: "Plastic-free conditioner bar, about 60 washes.",
        markers: &[SustainablePackaging, Recyclable, CrueltyFree, OrganicIngredients],
        popularity: 38,
        created_at: "2024-05-06",
    },
    SeedProduct {
        id: "bloom-009",
        name: "Mineral Sunscreen SPF 50",
        price_cents: 2900,
        brand: "Solenne",
        product_type: "sunscreen",
        description: "Zinc oxide sunscreen for dry and sensitive skin.",
        markers: &[],
        popularity: 49,
        created_at: "2024-05-27",
    },
    SeedProduct {
        id: "bloom-010",
        name: "Botanical Eau de Parfum",
        price_cents: 8800,
        brand: "Solenne",
        product_type: "fragrance",
        description: "Neroli, fig leaf and white musk.",
        markers: &[Recyclable],
        popularity: 9,
        created_at: "2024-06-14",
    },
];

const SEED_REVIEWS: &[SeedReview] = &[
    SeedReview {
        product_id: "bloom-001",
        rating: 5.0,
        author: "demo-ava",
        comment: "Soft hair, lovely scent.",
        created_at: "2024-02-01",
    },
    SeedReview {
        product_id: "bloom-001",
        rating: 4.0,
        author: "demo-noah",
        comment: "Good but pricey for the size.",
        created_at: "2024-02-15",
    },
    SeedReview {
        product_id: "bloom-003",
        rating: 5.0,
        author: "demo-mia",
        comment: "My winter rescue cream.",
        created_at: "2024-03-02",
    },
    SeedReview {
        product_id: "bloom-004",
        rating: 3.0,
        author: "demo-liam",
        comment: "Works, a little drying.",
        created_at: "2024-03-30",
    },
    SeedReview {
        product_id: "bloom-004",
        rating: 4.0,
        author: "demo-ava",
        comment: "Cleared things up in two weeks.",
        created_at: "2024-04-11",
    },
    SeedReview {
        product_id: "bloom-006",
        rating: 5.0,
        author: "demo-zoe",
        comment: "Visible glow.",
        created_at: "2024-04-25",
    },
    SeedReview {
        product_id: "bloom-008",
        rating: 4.0,
        author: "demo-noah",
        comment: "Lasts forever.",
        created_at: "2024-05-20",
    },
    SeedReview {
        product_id: "bloom-009",
        rating: 2.0,
        author: "demo-mia",
        comment: "White cast on darker skin.",
        created_at: "2024-06-09",
    },
];

const SEED_COUPONS: &[SeedCoupon] = &[
    SeedCoupon {
        code: "WELCOME10",
        kind: CouponKind::Percent,
        value: 10,
        min_subtotal: 0,
        active: true,
    },
    SeedCoupon {
        code: "BLOOM5",
        kind: CouponKind::Fixed,
        value: 5,
        min_subtotal: 30,
        active: true,
    },
    SeedCoupon {
        code: "SPRING24",
        kind: CouponKind::Percent,
        value: 20,
        min_subtotal: 50,
        active: false,
    },
];

pub struct SeedCatalog;

impl SeedCatalog {
    pub fn products() -> Vec<Product> {
        SEED_PRODUCTS.iter().map(SeedProduct::to_product).collect()
    }

    /// Inserts every seed record whose id is not taken yet. Reviews are only
    /// added alongside a product inserted by this call, so reloading does not
    /// duplicate them.
    pub async fn load(stores: &Stores) -> Result<SeedResult, RepositoryError> {
        let mut result = SeedResult::default();

        for seed in SEED_PRODUCTS {
            let id = ProductId::from(seed.id);
            if stores.products.find_by_id(&id).await?.is_some() {
                result.products_skipped += 1;
                continue;
            }
            stores.products.create(seed.to_product()).await?;
            result.products_inserted += 1;

            let reviews: Vec<&SeedReview> =
                SEED_REVIEWS.iter().filter(|review| review.product_id == seed.id).collect();
            for review in &reviews {
                stores.reviews.add(review.to_review()).await?;
                result.reviews_inserted += 1;
            }
            if !reviews.is_empty() {
                stores.refresh_review_summary(&id).await?;
            }
        }

        for seed in SEED_COUPONS {
            if stores.coupons.find_by_code(seed.code).await?.is_none() {
                stores.coupons.save(seed.to_coupon()).await?;
                result.coupons_inserted += 1;
            }
        }

        info!(
            event_name = "seed.loaded",
            products_inserted = result.products_inserted,
            products_skipped = result.products_skipped,
            reviews_inserted = result.reviews_inserted,
            coupons_inserted = result.coupons_inserted,
            "seed catalogue loaded"
        );
        Ok(result)
    }

    /// Checks that the seed records are present.
    pub async fn verify(stores: &Stores) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let mut products_present = true;
        let mut summaries_match = true;
        for seed in SEED_PRODUCTS {
            match stores.products.find_by_id(&ProductId::from(seed.id)).await? {
                Some(product) => {
                    let expected = SEED_REVIEWS
                        .iter()
                        .filter(|review| review.product_id == seed.id)
                        .count();
                    summaries_match &= product.reviews as usize >= expected;
                }
                None => products_present = false,
            }
        }
        checks.push(("products", products_present));
        checks.push(("review-summaries", products_present && summaries_match));

        let index = stores.reviews.index().await?;
        let reviews_present = SEED_REVIEWS.iter().all(|seed| {
            index
                .for_product(&ProductId::from(seed.product_id))
                .iter()
                .any(|review| review.author_id.0 == seed.author && review.comment == seed.comment)
        });
        checks.push(("reviews", reviews_present));

        let mut coupons_present = true;
        for seed in SEED_COUPONS {
            coupons_present &= stores.coupons.find_by_code(seed.code).await?.is_some();
        }
        checks.push(("coupons", coupons_present));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }
}

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    price_cents: i64,
    brand: &'static str,
    product_type: &'static str,
    description: &'static str,
    markers: &'static [Marker],
    popularity: u64,
    created_at: &'static str,
}

impl SeedProduct {
    fn to_product(&self) -> Product {
        let mut product = Product::new(self.id, self.name, Decimal::new(self.price_cents, 2))
            .with_brand(self.brand)
            .with_type(self.product_type)
            .with_markers(self.markers.iter().copied())
            .with_popularity(self.popularity);
        product.description = self.description.to_string();
        if let Some(created_at) = parse_timestamp(self.created_at) {
            product.created_at = created_at;
        }
        product
    }
}

struct SeedReview {
    product_id: &'static str,
    rating: f64,
    author: &'static str,
    comment: &'static str,
    created_at: &'static str,
}

impl SeedReview {
    fn to_review(&self) -> Review {
        Review {
            product_id: ProductId::from(self.product_id),
            rating: self.rating,
            comment: self.comment.to_string(),
            author_id: UserId::from(self.author),
            created_at: parse_timestamp(self.created_at).unwrap_or_default(),
        }
    }
}

struct SeedCoupon {
    code: &'static str,
    kind: CouponKind,
    value: i64,
    min_subtotal: i64,
    active: bool,
}

impl SeedCoupon {
    fn to_coupon(&self) -> Coupon {
        Coupon {
            code: self.code.to_string(),
            kind: self.kind,
            value: Decimal::from(self.value),
            min_subtotal: Decimal::from(self.min_subtotal),
            active: self.active,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SeedResult {
    pub products_inserted: usize,
    pub products_skipped: usize,
    pub reviews_inserted: usize,
    pub coupons_inserted: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

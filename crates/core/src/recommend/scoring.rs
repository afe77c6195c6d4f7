//! Affinity scoring for subscription box picks

use crate::domain::preferences::PreferenceProfile;
use crate::domain::product::Product;

/// Weights for each preference signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxWeights {
    /// Product type is one the user picked (default: 10)
    pub product_type: f64,
    /// Brand is one the user picked (default: 5)
    pub brand: f64,
    /// Per product marker the user prioritised (default: 3)
    pub marker: f64,
    /// Per skin concern found in the product type (default: 2)
    pub skin_concern: f64,
    /// Multiplier on the product's popularity (default: 0.1)
    pub popularity: f64,
}

impl Default for BoxWeights {
    fn default() -> Self {
        super::DEFAULT_BOX_WEIGHTS
    }
}

/// Scores products against one preference profile
#[derive(Debug, Clone)]
pub struct BoxScorer<'a> {
    profile: &'a PreferenceProfile,
    weights: BoxWeights,
}

impl<'a> BoxScorer<'a> {
    pub fn new(profile: &'a PreferenceProfile) -> Self {
        Self { profile, weights: BoxWeights::default() }
    }

    pub fn with_weights(profile: &'a PreferenceProfile, weights: BoxWeights) -> Self {
        Self { profile, weights }
    }

    /// Sum of every matching signal for a single product
    pub fn score(&self, product: &Product) -> f64 {
        let profile = self.profile;
        let mut score = 0.0;

        if profile.product_types.contains(&product.product_type) {
            score += self.weights.product_type;
        }
        if profile.brands.contains(&product.brand) {
            score += self.weights.brand;
        }

        let shared_markers = product
            .markers
            .iter()
            .filter(|marker| profile.sustainability_priorities.contains(marker))
            .count();
        score += self.weights.marker * shared_markers as f64;

        let product_type = product.product_type.to_lowercase();
        let concern_hits = profile
            .skin_concerns
            .iter()
            .filter(|concern| product_type.contains(&concern.to_lowercase()))
            .count();
        score += self.weights.skin_concern * concern_hits as f64;

        score + product.popularity as f64 * self.weights.popularity
    }

    /// Highest scoring products first; equal scores keep catalogue order.
    pub fn rank<'p>(&self, products: &'p [Product]) -> Vec<(&'p Product, f64)> {
        let mut scored: Vec<(&Product, f64)> =
            products.iter().map(|product| (product, self.score(product))).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

/// Fills a box of `count` products. Without a profile the catalogue's first
/// products are returned as they are.
pub fn recommend(
    products: &[Product],
    profile: Option<&PreferenceProfile>,
    count: usize,
) -> Vec<Product> {
    let Some(profile) = profile else {
        return products.iter().take(count).cloned().collect();
    };

    BoxScorer::new(profile)
        .rank(products)
        .into_iter()
        .take(count)
        .map(|(product, _)| product.clone())
        .collect()
}

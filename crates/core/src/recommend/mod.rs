//! BloomBox recommendations
//!
//! Ranks the catalogue against a quiz-derived preference profile and picks the
//! products that go into a subscription box.

mod scoring;

pub use scoring::{recommend, BoxScorer, BoxWeights};

/// Default scoring weights
pub const DEFAULT_BOX_WEIGHTS: BoxWeights = BoxWeights {
    product_type: 10.0,
    brand: 5.0,
    marker: 3.0,
    skin_concern: 2.0,
    popularity: 0.1,
};

/// Products in a box when the caller does not ask for a size
pub const DEFAULT_BOX_SIZE: usize = 4;

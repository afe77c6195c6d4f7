pub mod cart;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;

pub use cart::{Cart, CartLine, CartTotals, Coupon, CouponKind};
pub use catalog::{query, Catalog, CatalogQuery, Category, FilterState, PriceBucket, SortDirective};
pub use domain::preferences::PreferenceProfile;
pub use domain::product::{Marker, Product, ProductId, ProductPatch};
pub use domain::review::{Review, ReviewIndex};
pub use domain::user::UserId;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommend::{recommend, BoxScorer, BoxWeights, DEFAULT_BOX_SIZE};

pub mod lenient;
pub mod preferences;
pub mod product;
pub mod review;
pub mod user;

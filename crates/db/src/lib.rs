pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod stores;

pub use connection::{connect, connect_for, connect_with_settings, ping, DbPool};
pub use fixtures::{SeedCatalog, SeedResult, VerificationResult};
pub use repositories::RepositoryError;
pub use stores::{open_stores, Stores};

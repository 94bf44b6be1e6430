// Service exports
pub mod appwrite;
pub mod auth;
pub mod postgres;
pub mod scorer;

pub use appwrite::{AppwriteClient, AppwriteError};
pub use auth::{Claims, JwtIdentityResolver};
pub use postgres::{PostgresClient, PostgresError};
pub use scorer::HttpCompatibilityScorer;

//! service-core: shared HTTP service infrastructure.
//!
//! Configuration base, the `AppError` response taxonomy, tracing setup and
//! the middleware stack every service mounts.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use async_trait;
pub use axum;
pub use mongodb;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;

//! HTTP status and ingestion surface

pub mod routes;

pub use routes::{build_router, AppError};

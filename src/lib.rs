//! Geopost Service
//!
//! Backend for a location-aware content-sharing app: media upload to S3,
//! face classification for jpeg images, geo-indexed posts in Elasticsearch,
//! and JWT-authenticated search and clustering queries.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};

//! Shared utilities, configuration, and error handling for Postdeck
//!
//! This crate provides common functionality used across the Postdeck application:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Custom axum extractors
//! - State machine error types

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{Pagination, ValidatedJson};
pub use state::StateError;

//! Core types and shared functionality for clippings.
//!
//! This crate provides:
//! - Unified error types
//! - Layered configuration
//! - The article record data model

pub mod config;
pub mod error;
pub mod record;

pub use config::AppConfig;
pub use error::Error;
pub use record::{ArticleRecord, BatchProgress};

//! Catalog statistics over a streaming-service title CSV
//!
//! Loads the catalog, normalizes it into narrow per-attribute tables and
//! computes duration, rating and release-year aggregates for console and PNG
//! charts and an interactive lookup menu.

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod presentation;
pub mod types;

pub use error::{CatalogError, Result};

// Data processing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;

// Re-export key types and functions from each stage
pub use ingestion::{load, load_path};
pub use processing::normalize::normalize;
pub use storage::CatalogSnapshot;

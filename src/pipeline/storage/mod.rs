// Pipeline storage: the immutable normalized snapshot

pub mod in_memory;

pub use in_memory::CatalogSnapshot;

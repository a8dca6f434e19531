/// Catalog asset type, category filter and uniform random selection.
pub mod image_catalog;

/// Catalog fetch lifecycle: load, poll, fail, explicit reload.
pub mod catalog_loader;

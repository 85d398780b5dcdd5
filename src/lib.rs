//! Translation catalogs for Isomesh Viewer.
//!
//! Catalogs are Qt Linguist `.ts` files loaded once at startup. Lookups never
//! fail: a missing, empty or unfinished translation yields the source text.

pub mod config;
pub mod errors;
pub mod i18n;
pub mod models;
pub mod stats;
pub mod ts;

pub use errors::{CatalogError, CatalogResult};
pub use i18n::{tr, Catalog, Language};

//! Technician discovery and listing for the marketplace.
//! - Great-circle distance and bounding-box prefiltering (`geo`).
//! - Radius search with a strategy fixed at startup (`discovery`).
//! - Opaque-cursor and offset pagination over any record source (`pagination`, `source`).

pub mod errors;
pub mod geo;
pub mod pagination;
pub mod source;
pub mod discovery;
pub mod filters;
pub mod marketplace;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use marketplace::Marketplace;

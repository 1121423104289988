//! SeaORM entities for the marketplace tables plus small create helpers
//! that validate fields before insert.

pub mod errors;
pub mod db;
pub mod user;
pub mod technician;
pub mod location;
pub mod service_category;
pub mod service;
pub mod review;
pub mod bookmark;

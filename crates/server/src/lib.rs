pub mod state;
pub mod errors;
pub mod metrics;
pub mod routes;
pub mod openapi;
pub mod startup;

pub use startup::run;

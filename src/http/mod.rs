//! HTTP interface
//!
//! The byte-level contract around the pipeline: uploads stream straight
//! from the request body into a conversion, stored artifacts stream back
//! out byte for byte.

pub mod handlers;
pub mod routes;

pub use routes::create_router;

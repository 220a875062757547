//! Products domain module.
//!
//! This crate contains the catalog product aggregate and its creation event,
//! implemented as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{PRODUCT_CREATED, Product, ProductCreated, validate};

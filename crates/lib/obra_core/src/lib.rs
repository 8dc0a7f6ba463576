//! # obra_core
//!
//! Core session and access control logic for Obra.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

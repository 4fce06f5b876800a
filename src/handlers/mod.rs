//! HTTP handlers for tenant context inspection and connection-cache administration.

pub mod tenancy;
pub use tenancy::*;

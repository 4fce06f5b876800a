//! Axum extractors for the request's tenant.

pub mod tenant;

pub use tenant::{tenant_from_headers, CurrentTenant, TenantHeader, CLIENT_HEADER, TENANT_ID_HEADER};

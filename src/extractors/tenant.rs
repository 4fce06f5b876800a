//! Extract tenant id from request headers or from the bound tenant context.

use crate::context::TenantContext;
use crate::error::TenantError;
use crate::tenant::TenantId;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

/// Canonical header carrying the tenant id.
pub const TENANT_ID_HEADER: &str = "X-Tenant-Id";

/// Alternate header some callers send instead of `X-Tenant-Id`.
pub const CLIENT_HEADER: &str = "X-Client";

/// Tenant named by the request headers. `X-Tenant-Id` wins over `X-Client`; blank values are ignored.
pub fn tenant_from_headers(headers: &HeaderMap) -> Option<TenantId> {
    header_tenant(headers, TENANT_ID_HEADER).or_else(|| header_tenant(headers, CLIENT_HEADER))
}

fn header_tenant(headers: &HeaderMap, name: &str) -> Option<TenantId> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(TenantId::parse)
}

/// Optional tenant id straight from the headers. Never rejects.
#[derive(Clone, Debug)]
pub struct TenantHeader(pub Option<TenantId>);

#[async_trait]
impl<S> FromRequestParts<S> for TenantHeader
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(TenantHeader(tenant_from_headers(&parts.headers)))
    }
}

/// Tenant bound to the request context by [`crate::TenantLayer`]. Rejects with 400 when unset.
#[derive(Clone, Debug)]
pub struct CurrentTenant(pub TenantId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = TenantError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TenantContext::require_current_tenant().map(CurrentTenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn primary_header() {
        let h = headers(&[("x-tenant-id", " 42 ")]);
        assert_eq!(tenant_from_headers(&h), Some(TenantId::new("42")));
    }

    #[test]
    fn alternate_header() {
        let h = headers(&[("x-client", "acme")]);
        assert_eq!(tenant_from_headers(&h), Some(TenantId::new("acme")));
    }

    #[test]
    fn primary_wins_over_alternate() {
        let h = headers(&[("x-tenant-id", "primary"), ("x-client", "alternate")]);
        assert_eq!(tenant_from_headers(&h), Some(TenantId::new("primary")));
    }

    #[test]
    fn blank_primary_falls_back_to_alternate() {
        let h = headers(&[("x-tenant-id", "  "), ("x-client", "alternate")]);
        assert_eq!(tenant_from_headers(&h), Some(TenantId::new("alternate")));
    }

    #[test]
    fn absent_or_blank() {
        assert_eq!(tenant_from_headers(&HeaderMap::new()), None);
        assert_eq!(tenant_from_headers(&headers(&[("x-client", "")])), None);
    }
}

//! Typed errors and HTTP mapping.

use crate::tenant::TenantId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures talking to the tenant-configuration authority. Never escapes the resolver's
/// public API: resolution collapses these into an absent result.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("tenant {0} not found")]
    NotFound(TenantId),
    #[error("tenant {0} is inactive")]
    Inactive(TenantId),
    #[error("authority rejected tenant {tenant}: {message}")]
    Rejected { tenant: TenantId, message: String },
    #[error("unexpected status {status} for tenant {tenant}")]
    UnexpectedStatus { tenant: TenantId, status: u16 },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid authority endpoint: {0}")]
    Endpoint(String),
    #[error("blank tenant id")]
    BlankTenant,
}

impl ResolutionError {
    /// 404 and 403 are expected answers about the tenant itself, not operational faults.
    pub fn is_tenant_state(&self) -> bool {
        matches!(self, ResolutionError::NotFound(_) | ResolutionError::Inactive(_))
    }
}

#[derive(Error, Debug)]
pub enum TenantError {
    #[error("no tenant context has been set for this request")]
    ContextNotSet,
    #[error("tenant id is not a valid integer: {0}")]
    InvalidTenantIdFormat(String),
    #[error("tenant not resolvable: {0}")]
    Unresolvable(TenantId),
    #[error("config: {0}")]
    Config(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TenantError::ContextNotSet => (StatusCode::BAD_REQUEST, "tenant_context_not_set"),
            TenantError::InvalidTenantIdFormat(_) => (StatusCode::BAD_REQUEST, "invalid_tenant_id"),
            TenantError::Unresolvable(_) => (StatusCode::SERVICE_UNAVAILABLE, "tenant_unresolvable"),
            TenantError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        };
        let details = match &self {
            TenantError::Unresolvable(tenant) => Some(serde_json::json!({ "tenantId": tenant })),
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(TenantError::ContextNotSet.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            TenantError::InvalidTenantIdFormat("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TenantError::Unresolvable(TenantId::new("7")).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            TenantError::Config("bad".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn tenant_state_errors() {
        assert!(ResolutionError::NotFound(TenantId::new("1")).is_tenant_state());
        assert!(ResolutionError::Inactive(TenantId::new("1")).is_tenant_state());
        assert!(!ResolutionError::Malformed("x".into()).is_tenant_state());
    }
}

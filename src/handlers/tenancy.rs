//! Tenancy handlers: health, version, current tenant, cached connections and invalidation.

use crate::error::TenantError;
use crate::extractors::tenant::CurrentTenant;
use crate::response::{success_many, success_one_ok};
use crate::state::AppState;
use crate::tenant::TenantId;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cachedConnections": state.resolver.cache().len()
    }))
}

pub async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /tenant/context: the request's tenant, provided its datastore resolves.
pub async fn current_tenant(
    CurrentTenant(tenant): CurrentTenant,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TenantError> {
    state.resolver.require_current_connection().await?;
    Ok(success_one_ok(json!({
        "tenantId": tenant,
        "connectionResolved": true
    })))
}

/// GET /tenants/connections: cached tenants and when they were resolved. Connection strings stay private.
pub async fn list_cached_connections(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<Value> = state
        .resolver
        .cache()
        .cached_tenants()
        .into_iter()
        .map(|(tenant, resolved_at)| json!({ "tenantId": tenant, "resolvedAt": resolved_at }))
        .collect();
    success_many(data)
}

/// DELETE /tenants/connections: flush the whole cache.
pub async fn invalidate_all_connections(State(state): State<AppState>) -> impl IntoResponse {
    let removed = state.resolver.invalidate_all();
    success_one_ok(json!({ "invalidated": removed }))
}

/// DELETE /tenants/:tenant_id/connection: drop one tenant's cached connection.
pub async fn invalidate_tenant_connection(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, TenantError> {
    let tenant = TenantId::parse(&tenant_id).ok_or(TenantError::InvalidTenantIdFormat(tenant_id))?;
    let removed = state.resolver.invalidate_tenant(&tenant);
    Ok(success_one_ok(json!({ "tenantId": tenant, "invalidated": removed })))
}

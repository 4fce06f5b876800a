//! Tenancy routes: health, version, current tenant and connection-cache administration.
//! Every route runs inside a tenant context scope seeded from the request headers.

use crate::handlers::tenancy::{
    current_tenant, health, invalidate_all_connections, invalidate_tenant_connection, list_cached_connections,
    version,
};
use crate::middleware::TenantLayer;
use crate::state::AppState;
use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn tenancy_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/tenant/context", get(current_tenant))
        .route(
            "/tenants/connections",
            get(list_cached_connections).delete(invalidate_all_connections),
        )
        .route("/tenants/:tenant_id/connection", delete(invalidate_tenant_connection))
        .layer(TenantLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

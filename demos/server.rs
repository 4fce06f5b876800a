//! Example server: resolves tenants against the authority at `TENANT_SERVICE_URL`, mounts the
//! tenancy routes under /api/v1 and one sample domain route that needs the tenant's datastore.

use axum::{routing::get, Json, Router};
use serde_json::json;
use tenancy_sdk::{
    tenancy_routes, AppState, ConnectionResolver, CurrentTenant, TenancyConfig, TenantContext, TenantError,
    TenantLayer,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenancy_sdk=info,tower_http=info")),
        )
        .init();

    let config = TenancyConfig::from_env()?;
    let datastores = config.datastores.clone();
    let resolver = ConnectionResolver::new(&config)?;
    let state = AppState::new(resolver.clone());

    // A domain endpoint: storage code only ever sees the connection bound for this request.
    let orders = Router::new()
        .route(
            "/orders/datastore",
            get(move |CurrentTenant(tenant): CurrentTenant| {
                let resolver = resolver.clone();
                let datastores = datastores.clone();
                async move {
                    resolver.require_current_connection().await?;
                    let central = TenantContext::connection_or_default(&datastores, true).is_some();
                    Ok::<_, TenantError>(Json(json!({
                        "tenantId": tenant,
                        "datastoreBound": TenantContext::connection().is_some(),
                        "centralConfigured": central
                    })))
                }
            }),
        )
        .layer(TenantLayer::new());

    let app = Router::new().nest("/api/v1", tenancy_routes(state).merge(orders));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

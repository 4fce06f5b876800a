//! Tenancy SDK: tenant-scoped request context and cached per-tenant datastore resolution.

pub mod authority;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod state;
pub mod tenant;

pub use authority::{AuthorityClient, DatabaseConnection};
pub use cache::{ConnectionCache, ConnectionRecord};
pub use config::{DatastoreDefaults, TenancyConfig};
pub use context::{ContextGuard, RequestContext, TenantContext};
pub use error::{ResolutionError, TenantError};
pub use extractors::{tenant_from_headers, CurrentTenant, TenantHeader, CLIENT_HEADER, TENANT_ID_HEADER};
pub use middleware::{enter_request, TenantLayer, TenantService};
pub use resolver::ConnectionResolver;
pub use routes::tenancy_routes;
pub use state::AppState;
pub use tenant::TenantId;

//! ConnectionResolver: cache-first lookup of a tenant's datastore, falling through to the
//! tenant authority on a miss.
//!
//! Failures of any kind come back as `None` and are never cached, so an authority outage is
//! retried on the very next call instead of being remembered.

use crate::authority::AuthorityClient;
use crate::cache::ConnectionCache;
use crate::config::TenancyConfig;
use crate::context::TenantContext;
use crate::error::{ResolutionError, TenantError};
use crate::tenant::TenantId;
use serde_json::{Map, Value};

#[derive(Clone, Debug)]
pub struct ConnectionResolver {
    authority: AuthorityClient,
    cache: ConnectionCache,
}

impl ConnectionResolver {
    pub fn new(config: &TenancyConfig) -> Result<Self, TenantError> {
        Ok(Self::with_parts(AuthorityClient::new(config)?, ConnectionCache::new()))
    }

    /// Build around an existing cache, e.g. one shared with other resolvers in the process.
    pub fn with_parts(authority: AuthorityClient, cache: ConnectionCache) -> Self {
        Self { authority, cache }
    }

    pub fn cache(&self) -> &ConnectionCache {
        &self.cache
    }

    pub fn authority(&self) -> &AuthorityClient {
        &self.authority
    }

    /// Connection string for `tenant`, from cache or from the authority.
    pub async fn resolve_connection(&self, tenant: &TenantId) -> Option<String> {
        if let Some(cached) = self.cache.get(tenant) {
            tracing::debug!("using cached connection for tenant {}", tenant);
            return Some(cached);
        }
        tracing::debug!("no cached connection for tenant {}, asking authority", tenant);
        let generation = self.cache.generation();
        let fetched = self
            .authority
            .database_connection(tenant)
            .await
            .and_then(|conn| conn.connection_string());
        match fetched {
            Ok(connection) => {
                if self.cache.put_if_current(tenant.clone(), connection.clone(), generation) {
                    tracing::info!("resolved connection for tenant {}", tenant);
                } else {
                    tracing::debug!("cache invalidated while resolving tenant {}, not storing", tenant);
                }
                Some(connection)
            }
            Err(e) => {
                log_failure("database connection", tenant, &e);
                None
            }
        }
    }

    /// Resolve the request's tenant and bind the result with [`TenantContext::set_connection`].
    /// A missing tenant binding is an error; an unresolvable tenant is `Ok(None)`.
    pub async fn resolve_current_connection(&self) -> Result<Option<String>, TenantError> {
        let tenant = TenantContext::require_current_tenant()?;
        let connection = self.resolve_connection(&tenant).await;
        if let Some(conn) = &connection {
            TenantContext::set_connection(conn.clone());
        }
        Ok(connection)
    }

    /// Like [`ConnectionResolver::resolve_current_connection`], rejecting unresolvable tenants.
    pub async fn require_current_connection(&self) -> Result<String, TenantError> {
        let tenant = TenantContext::require_current_tenant()?;
        match self.resolve_current_connection().await? {
            Some(conn) => Ok(conn),
            None => Err(TenantError::Unresolvable(tenant)),
        }
    }

    /// Forget one tenant's connection; the next resolution goes to the authority.
    pub fn invalidate_tenant(&self, tenant: &TenantId) -> bool {
        let removed = self.cache.invalidate(tenant);
        tracing::debug!("invalidated cached connection for tenant {} (present: {})", tenant, removed);
        removed
    }

    pub fn invalidate_all(&self) -> usize {
        let removed = self.cache.invalidate_all();
        tracing::info!("cleared {} cached tenant connections", removed);
        removed
    }

    /// Object-storage settings for `tenant`. Fetched on every call.
    pub async fn resolve_s3_configuration(&self, tenant: &TenantId) -> Option<Map<String, Value>> {
        match self.authority.s3_configuration(tenant).await {
            Ok(config) => {
                tracing::info!("fetched s3 configuration for tenant {}", tenant);
                Some(config)
            }
            Err(e) => {
                log_failure("s3 configuration", tenant, &e);
                None
            }
        }
    }

    /// Tenant settings, optionally a sub-tree addressed by `settings_path`. Fetched on every call.
    pub async fn resolve_settings(&self, tenant: &TenantId, settings_path: Option<&str>) -> Option<Map<String, Value>> {
        match self.authority.settings(tenant, settings_path).await {
            Ok(settings) => {
                tracing::debug!("fetched settings for tenant {}", tenant);
                Some(settings)
            }
            Err(e) => {
                log_failure("settings", tenant, &e);
                None
            }
        }
    }
}

fn log_failure(what: &str, tenant: &TenantId, err: &ResolutionError) {
    if err.is_tenant_state() {
        tracing::warn!("{} unavailable for tenant {}: {}", what, tenant, err);
    } else {
        tracing::error!("error resolving {} for tenant {}: {}", what, tenant, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use std::time::Duration;

    // Nothing listens on the discard port; any network call fails fast.
    fn offline_resolver() -> ConnectionResolver {
        let config = TenancyConfig::new("http://127.0.0.1:9")
            .connect_timeout(Duration::from_millis(200))
            .read_timeout(Duration::from_millis(500));
        ConnectionResolver::new(&config).unwrap()
    }

    #[tokio::test]
    async fn cache_hit_needs_no_authority() {
        let resolver = offline_resolver();
        let tenant = TenantId::new("42");
        resolver.cache().put(tenant.clone(), "mongodb://h:1/db0/t42".into());
        assert_eq!(
            resolver.resolve_connection(&tenant).await.as_deref(),
            Some("mongodb://h:1/db0/t42")
        );
    }

    #[tokio::test]
    async fn unreachable_authority_is_absent_and_uncached() {
        let resolver = offline_resolver();
        let tenant = TenantId::new("42");
        assert_eq!(resolver.resolve_connection(&tenant).await, None);
        assert!(resolver.cache().is_empty());
        assert_eq!(resolver.resolve_s3_configuration(&tenant).await, None);
        assert_eq!(resolver.resolve_settings(&tenant, Some("billing")).await, None);
    }

    #[tokio::test]
    async fn current_connection_requires_tenant() {
        let resolver = offline_resolver();
        let result = TenantContext::scope(RequestContext::default(), resolver.resolve_current_connection()).await;
        assert!(matches!(result, Err(TenantError::ContextNotSet)));
    }

    #[tokio::test]
    async fn current_connection_binds_into_context() {
        let resolver = offline_resolver();
        resolver.cache().put(TenantId::new("7"), "mongodb://h/t7".into());
        let bound = TenantContext::scope(RequestContext::new(Some(TenantId::new("7"))), async {
            let conn = resolver.require_current_connection().await.unwrap();
            (conn, TenantContext::connection())
        })
        .await;
        assert_eq!(bound.0, "mongodb://h/t7");
        assert_eq!(bound.1.as_deref(), Some("mongodb://h/t7"));
    }

    #[tokio::test]
    async fn require_current_connection_reports_unresolvable() {
        let resolver = offline_resolver();
        let result = TenantContext::execute_with_tenant_async("8", resolver.require_current_connection()).await;
        match result {
            Err(TenantError::Unresolvable(tenant)) => assert_eq!(tenant, TenantId::new("8")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn invalidation_passes_through() {
        let resolver = offline_resolver();
        resolver.cache().put(TenantId::new("1"), "a".into());
        resolver.cache().put(TenantId::new("2"), "b".into());
        assert!(resolver.invalidate_tenant(&TenantId::new("1")));
        assert!(!resolver.invalidate_tenant(&TenantId::new("1")));
        assert_eq!(resolver.invalidate_all(), 1);
        assert!(resolver.cache().is_empty());
    }
}

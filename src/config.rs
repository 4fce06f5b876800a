//! Runtime configuration: authority endpoint, timeouts and datastore fallbacks. Loaded from env.

use crate::error::TenantError;
use std::time::Duration;

pub const DEFAULT_AUTHORITY_URL: &str = "http://localhost:6010";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Datastore URLs used when no tenant connection is bound to the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatastoreDefaults {
    pub default_url: Option<String>,
    /// Shared datastore holding fleet-wide data (tenant registry and similar).
    pub central_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TenancyConfig {
    /// Base URL of the tenant-configuration authority, without the `/api/v1/...` suffix.
    pub authority_url: String,
    pub connect_timeout: Duration,
    /// Bound on the whole request, body included.
    pub read_timeout: Duration,
    pub datastores: DatastoreDefaults,
}

impl TenancyConfig {
    pub fn new(authority_url: impl Into<String>) -> Self {
        Self {
            authority_url: authority_url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            datastores: DatastoreDefaults::default(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn datastores(mut self, datastores: DatastoreDefaults) -> Self {
        self.datastores = datastores;
        self
    }

    /// Read `TENANT_SERVICE_URL`, `TENANT_CONNECT_TIMEOUT_SECS`, `TENANT_READ_TIMEOUT_SECS`,
    /// `DEFAULT_DATASTORE_URL` and `CENTRAL_DATASTORE_URL`.
    pub fn from_env() -> Result<Self, TenantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TenantError> {
        let authority_url = lookup("TENANT_SERVICE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHORITY_URL.into());
        let connect_timeout = timeout_var(&lookup, "TENANT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT)?;
        let read_timeout = timeout_var(&lookup, "TENANT_READ_TIMEOUT_SECS", DEFAULT_READ_TIMEOUT)?;
        let datastores = DatastoreDefaults {
            default_url: lookup("DEFAULT_DATASTORE_URL").filter(|s| !s.is_empty()),
            central_url: lookup("CENTRAL_DATASTORE_URL").filter(|s| !s.is_empty()),
        };
        Ok(Self {
            authority_url,
            connect_timeout,
            read_timeout,
            datastores,
        })
    }
}

fn timeout_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration, TenantError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| TenantError::Config(format!("{} must be a whole number of seconds, got {:?}", key, raw)))?;
    if secs == 0 {
        return Err(TenantError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let config = TenancyConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.authority_url, DEFAULT_AUTHORITY_URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.datastores, DatastoreDefaults::default());
    }

    #[test]
    fn reads_overrides() {
        let config = TenancyConfig::from_lookup(lookup_from(&[
            ("TENANT_SERVICE_URL", "http://tenants.internal:8080"),
            ("TENANT_CONNECT_TIMEOUT_SECS", "3"),
            ("TENANT_READ_TIMEOUT_SECS", " 5 "),
            ("CENTRAL_DATASTORE_URL", "mongodb://central:27017/tenants"),
        ]))
        .unwrap();
        assert_eq!(config.authority_url, "http://tenants.internal:8080");
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.datastores.central_url.as_deref(), Some("mongodb://central:27017/tenants"));
        assert_eq!(config.datastores.default_url, None);
    }

    #[test]
    fn rejects_bad_timeouts() {
        assert!(matches!(
            TenancyConfig::from_lookup(lookup_from(&[("TENANT_READ_TIMEOUT_SECS", "soon")])),
            Err(TenantError::Config(_))
        ));
        assert!(matches!(
            TenancyConfig::from_lookup(lookup_from(&[("TENANT_CONNECT_TIMEOUT_SECS", "0")])),
            Err(TenantError::Config(_))
        ));
    }
}

//! HTTP client for the tenant-configuration authority (`/api/v1/tenants/internal/{id}/...`).
//!
//! Every call is a single GET bounded by the configured connect and read timeouts. Nothing here
//! retries or caches; the resolver decides what to keep.

use crate::config::TenancyConfig;
use crate::error::{ResolutionError, TenantError};
use crate::response::AuthorityResponse;
use crate::tenant::TenantId;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

const DATABASE_CONNECTION: &str = "database-connection";
const S3_CONFIGURATION: &str = "s3-configuration";
const SETTINGS: &str = "settings";

/// Payload of the database-connection endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConnection {
    /// Store URL without database, e.g. `mongodb://host:27017`.
    pub url: String,
    pub database_name: String,
}

impl DatabaseConnection {
    /// Fully qualified connection string: `url + "/" + databaseName`.
    pub fn connection_string(&self) -> Result<String, ResolutionError> {
        if self.url.trim().is_empty() || self.database_name.trim().is_empty() {
            return Err(ResolutionError::Malformed(
                "database connection is missing url or databaseName".into(),
            ));
        }
        Ok(format!("{}/{}", self.url, self.database_name))
    }
}

#[derive(Clone, Debug)]
pub struct AuthorityClient {
    base_url: Url,
    http: reqwest::Client,
}

impl AuthorityClient {
    pub fn new(config: &TenancyConfig) -> Result<Self, TenantError> {
        let base_url = Url::parse(&config.authority_url).map_err(|e| {
            TenantError::Config(format!("invalid authority url {}: {}", config.authority_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TenantError::Config(format!(
                "authority url {} cannot carry a path",
                config.authority_url
            )));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| TenantError::Config(format!("http client: {}", e)))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn database_connection(&self, tenant: &TenantId) -> Result<DatabaseConnection, ResolutionError> {
        let url = self.endpoint(tenant, DATABASE_CONNECTION)?;
        self.fetch(tenant, url).await
    }

    pub async fn s3_configuration(&self, tenant: &TenantId) -> Result<Map<String, Value>, ResolutionError> {
        let url = self.endpoint(tenant, S3_CONFIGURATION)?;
        self.fetch(tenant, url).await
    }

    /// Tenant settings, optionally narrowed to a sub-tree. A blank path is not sent.
    pub async fn settings(
        &self,
        tenant: &TenantId,
        settings_path: Option<&str>,
    ) -> Result<Map<String, Value>, ResolutionError> {
        let mut url = self.endpoint(tenant, SETTINGS)?;
        if let Some(path) = settings_path.map(str::trim).filter(|p| !p.is_empty()) {
            url.query_pairs_mut().append_pair("settingsPath", path);
        }
        self.fetch(tenant, url).await
    }

    /// The tenant id goes in as one encoded path segment. Blank ids never reach the network.
    fn endpoint(&self, tenant: &TenantId, resource: &str) -> Result<Url, ResolutionError> {
        if tenant.as_str().trim().is_empty() {
            return Err(ResolutionError::BlankTenant);
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ResolutionError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v1", "tenants", "internal", tenant.as_str(), resource]);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, tenant: &TenantId, url: Url) -> Result<T, ResolutionError> {
        tracing::debug!("calling tenant authority: {}", url);
        let resp = self.http.get(url).send().await?;
        match resp.status() {
            StatusCode::OK => {
                let body = resp.bytes().await?;
                let envelope: AuthorityResponse<T> =
                    serde_json::from_slice(&body).map_err(|e| ResolutionError::Malformed(e.to_string()))?;
                envelope.into_data().map_err(|message| ResolutionError::Rejected {
                    tenant: tenant.clone(),
                    message: message.unwrap_or_else(|| "no data returned".into()),
                })
            }
            StatusCode::NOT_FOUND => Err(ResolutionError::NotFound(tenant.clone())),
            StatusCode::FORBIDDEN => Err(ResolutionError::Inactive(tenant.clone())),
            status => Err(ResolutionError::UnexpectedStatus {
                tenant: tenant.clone(),
                status: status.as_u16(),
            }),
        }
    }
}

//! Tenant identifier: opaque string, optionally numeric.

use crate::error::TenantError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one tenant within the fleet. Inbound values go through [`TenantId::parse`], which
/// rejects blank input; ids built with `new`/`From` are taken as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        TenantId(id.into())
    }

    /// Build from an inbound value (header, path segment). Trims whitespace; blank yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(TenantId(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Numeric view for services that key tenants by integer.
    pub fn as_int(&self) -> Result<i64, TenantError> {
        self.0
            .parse()
            .map_err(|_| TenantError::InvalidTenantIdFormat(self.0.clone()))
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        TenantId(id)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        TenantId(id.to_string())
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        TenantId(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(TenantId::parse("  42 "), Some(TenantId::new("42")));
        assert_eq!(TenantId::parse("   "), None);
        assert_eq!(TenantId::parse(""), None);
    }

    #[test]
    fn numeric_view() {
        assert_eq!(TenantId::from(42).as_int().unwrap(), 42);
        match TenantId::new("acme").as_int() {
            Err(TenantError::InvalidTenantIdFormat(raw)) => assert_eq!(raw, "acme"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_value(TenantId::new("t1")).unwrap();
        assert_eq!(json, serde_json::json!("t1"));
    }
}

//! Response envelopes: what the admin routes send, and what the tenant authority sends back.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta: None }))
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

/// Envelope returned by every tenant-authority endpoint. Extra fields (`timestamp`) are ignored.
#[derive(Debug, Deserialize)]
pub struct AuthorityResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> AuthorityResponse<T> {
    /// The payload, only when the authority reported success and sent data.
    pub fn into_data(self) -> Result<T, Option<String>> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authority_success_with_data() {
        let resp: AuthorityResponse<serde_json::Value> = serde_json::from_value(json!({
            "success": true,
            "message": "ok",
            "data": {"bucket": "b1"},
            "timestamp": "2024-05-01T10:00:00"
        }))
        .unwrap();
        assert_eq!(resp.into_data().unwrap(), json!({"bucket": "b1"}));
    }

    #[test]
    fn authority_rejection_keeps_message() {
        let resp: AuthorityResponse<serde_json::Value> =
            serde_json::from_value(json!({"success": false, "message": "tenant suspended"})).unwrap();
        assert_eq!(resp.into_data().unwrap_err().as_deref(), Some("tenant suspended"));

        let resp: AuthorityResponse<serde_json::Value> =
            serde_json::from_value(json!({"success": true, "data": null})).unwrap();
        assert_eq!(resp.into_data().unwrap_err(), None);
    }

    #[test]
    fn many_counts_items() {
        let (status, Json(body)) = success_many(vec![1, 2, 3]);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.meta.count, 3);
    }
}

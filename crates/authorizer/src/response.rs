//! Gateway proxy response envelopes.
//!
//! Status-code-to-body helpers for hosts that answer the routing layer with
//! proxy responses. String bodies are JSON-encoded so the wire shape is
//! uniform; structured bodies serialize through serde.

use serde::{Deserialize, Serialize};

/// A proxy response in the shape the gateway forwards to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Serialized body, absent for bodyless responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ProxyResponse {
    /// Response with the given status code and no body.
    #[must_use]
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            body: None,
        }
    }

    /// 200 with a JSON-serialized body.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error when `body` cannot be
    /// rendered as JSON.
    pub fn ok<T: Serialize>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: 200,
            body: Some(serde_json::to_string(body)?),
        })
    }

    /// 204 with no body.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// 401 with the uniform unauthorized message.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            status_code: 401,
            body: Some(serde_json::json!({"message": "Unauthorized"}).to_string()),
        }
    }

    /// 404 with a JSON-encoded message.
    #[must_use]
    pub fn not_found(message: &str) -> Self {
        Self {
            status_code: 404,
            body: Some(serde_json::Value::String(message.to_string()).to_string()),
        }
    }

    /// 409 with a JSON-encoded message.
    #[must_use]
    pub fn conflict(message: &str) -> Self {
        Self {
            status_code: 409,
            body: Some(serde_json::Value::String(message.to_string()).to_string()),
        }
    }

    /// 500 with a JSON body carrying the message.
    #[must_use]
    pub fn internal_server_error(message: &str) -> Self {
        Self {
            status_code: 500,
            body: Some(serde_json::json!({"message": message}).to_string()),
        }
    }
}

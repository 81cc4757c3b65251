//! RPC request/response envelope.
//!
//! One JSON object per line in both directions. The envelope carries the
//! method name, a caller-chosen correlation id, and the method-specific
//! payload; framing beyond newline delimiting is delegated to the transport.

use serde::{Deserialize, Serialize};

use crate::status::RpcStatus;

/// RPC request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Method name, e.g. `"LoadCapture"`.
    pub method: String,
    /// Caller-chosen request id, echoed back for correlation.
    #[serde(default)]
    pub request_id: String,
    /// Method-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// RPC response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Request id echoed from the request.
    pub request_id: String,
    /// Whether the call succeeded.
    pub ok: bool,
    /// Reply payload (present when ok=true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Status details (present when ok=false).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcStatus>,
}

impl RpcResponse {
    pub fn success(request_id: String, payload: serde_json::Value) -> Self {
        Self {
            request_id,
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(request_id: String, error: RpcStatus) -> Self {
        Self {
            request_id,
            ok: false,
            payload: None,
            error: Some(error),
        }
    }
}

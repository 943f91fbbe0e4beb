//! JSON-RPC 2.0 wire shapes
//!
//! Requests carry positional params. Responses share one shape for success
//! and failure; the `method` field is filled in locally from the pending
//! request, never read from the server.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Id carried by every locally synthesized failure
pub const SYNTHETIC_ID: i64 = -1;

/// Id reserved for server-pushed notifications
pub const NOTIFICATION_ID: i64 = 0;

pub const CODE_SERVICE_UNAVAILABLE: i32 = 503;
pub const CODE_REQUEST_TIMEOUT: i32 = 408;

/// Outbound request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Error object of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// 503 used when there is no connection or the connection went away
    pub fn service_unavailable() -> Self {
        Self::new(CODE_SERVICE_UNAVAILABLE, "Service Unavailable")
    }

    /// 503 carrying the detail of a failed write
    pub fn send_failed(detail: impl std::fmt::Display) -> Self {
        Self::new(CODE_SERVICE_UNAVAILABLE, detail.to_string())
    }

    /// 503 for a response body that does not fit the expected shape
    pub fn deserialize(detail: impl std::fmt::Display) -> Self {
        Self::new(CODE_SERVICE_UNAVAILABLE, format!("Deserialize Error: {}", detail))
    }

    /// 503 for a request dropped by a context reset
    pub fn abandoned() -> Self {
        Self::new(CODE_SERVICE_UNAVAILABLE, "Request Abandoned")
    }

    pub fn request_timeout() -> Self {
        Self::new(CODE_REQUEST_TIMEOUT, "Request Timeout")
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// Inbound response envelope, typed by the expected `result`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> RpcResponse<T> {
    /// Locally synthesized failure for `method`
    pub fn failure(method: impl Into<String>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: SYNTHETIC_ID,
            result: None,
            method: Some(method.into()),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }

    /// Split into result or error
    ///
    /// A response with neither is reported as `Ok(None)`.
    pub fn into_result(self) -> std::result::Result<Option<T>, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

impl<T: DeserializeOwned> RpcResponse<T> {
    /// Decode a raw response and stamp it with the originating method
    ///
    /// A body that does not fit `T` turns into a 503 failure.
    pub fn decode(raw: &str, method: &str) -> Self {
        match serde_json::from_str::<RpcResponse<T>>(raw) {
            Ok(mut response) => {
                response.method = Some(method.to_string());
                response
            }
            Err(e) => Self::failure(method, RpcError::deserialize(e)),
        }
    }
}

/// Nested payload of a notification
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEvent {
    pub event_name: String,
    #[serde(default)]
    pub event: Option<Value>,
}

#[derive(Deserialize)]
struct IncomingFrame {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    result: Option<Value>,
}

/// Classification of one inbound text frame
#[derive(Debug)]
pub enum Incoming {
    /// Reply to request `id`
    Response { id: i64 },
    /// Server push with a well-formed `{event_name, event}` payload
    Notification { event_name: String, event: Value },
    /// Notification without a usable nested payload
    Malformed(String),
}

impl Incoming {
    /// Classify a frame by its id
    ///
    /// A missing or null id counts as the notification id.
    pub fn classify(raw: &str) -> serde_json::Result<Self> {
        let frame: IncomingFrame = serde_json::from_str(raw)?;
        let id = frame.id.unwrap_or(NOTIFICATION_ID);
        if id != NOTIFICATION_ID {
            return Ok(Incoming::Response { id });
        }

        let update = match frame.result {
            Some(result) => match serde_json::from_value::<UpdateEvent>(result) {
                Ok(update) => update,
                Err(e) => return Ok(Incoming::Malformed(e.to_string())),
            },
            None => return Ok(Incoming::Malformed("missing result".to_string())),
        };

        match update.event {
            Some(event) if !event.is_null() => Ok(Incoming::Notification {
                event_name: update.event_name,
                event,
            }),
            _ => Ok(Incoming::Malformed(format!(
                "{} without event payload",
                update.event_name
            ))),
        }
    }
}

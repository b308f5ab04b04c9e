//! Problem responses and configuration errors
//!
//! A request that must not reach its resource is answered with an
//! [`ApiProblem`], serialized as `application/problem+json`:
//!
//! - `400` when the ruleset rejected the query parameters
//!   ([`ApiProblem::failed_validation`])
//! - `500` when configuration names a ruleset nobody can supply
//!   ([`ApiProblem::missing_ruleset`])
//!
//! # Example
//!
//! ```rust,ignore
//! match dispatcher.handle(&mut event)? {
//!     None => call_resource(event),
//!     Some(problem) => return problem.into_response(),
//! }
//! ```

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Content type of problem responses
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Default `type` URI of a problem when none is given
pub const DEFAULT_PROBLEM_TYPE: &str = "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html";

/// Additional field carrying per-field validation messages
pub const VALIDATION_MESSAGES_KEY: &str = "validation_messages";

/// Per-field validation messages, in the order the ruleset reported them
pub type ValidationMessages = IndexMap<String, Vec<String>>;

/// HTTP problem payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiProblem {
    #[serde(rename = "type")]
    problem_type: String,

    title: String,

    #[serde(rename = "status", serialize_with = "serialize_status")]
    status: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,

    #[serde(flatten)]
    additional: IndexMap<String, Value>,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl ApiProblem {
    /// Create a problem whose title is the status' reason phrase
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            problem_type: DEFAULT_PROBLEM_TYPE.to_string(),
            title: status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
            status,
            detail: Some(detail.into()),
            additional: IndexMap::new(),
        }
    }

    /// A configured ruleset cannot be supplied by the registry
    pub fn missing_ruleset(ruleset_id: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "Listed query ruleset \"{}\" does not exist; cannot validate request",
                ruleset_id
            ),
        )
    }

    /// A ruleset rejected the query parameters
    ///
    /// `messages` are embedded verbatim under `validation_messages`.
    pub fn failed_validation(messages: ValidationMessages) -> Self {
        let messages = messages
            .into_iter()
            .map(|(field, list)| {
                let list = list.into_iter().map(Value::String).collect();
                (field, Value::Array(list))
            })
            .collect::<serde_json::Map<String, Value>>();

        Self::new(StatusCode::BAD_REQUEST, "Failed Validation")
            .with_title("Failed Validation")
            .with_additional(VALIDATION_MESSAGES_KEY, Value::Object(messages))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, problem_type: impl Into<String>) -> Self {
        self.problem_type = problem_type.into();
        self
    }

    pub fn without_detail(mut self) -> Self {
        self.detail = None;
        self
    }

    /// Attach an extra top-level field to the payload
    ///
    /// Keys colliding with `type`, `title`, `status` or `detail` are ignored.
    pub fn with_additional(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !matches!(key.as_str(), "type" | "title" | "status" | "detail") {
            self.additional.insert(key, value);
        }
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn problem_type(&self) -> &str {
        &self.problem_type
    }

    pub fn additional(&self, key: &str) -> Option<&Value> {
        self.additional.get(key)
    }

    /// Whether the problem is the client's fault (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Whether the problem is a server-side defect (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Serialize the payload as JSON
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl std::fmt::Display for ApiProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} {}: {}", self.status.as_u16(), self.title, detail),
            None => write!(f, "{} {}", self.status.as_u16(), self.title),
        }
    }
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let status = self.status;
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to loading validation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// IO error while reading configuration
    #[error("IO error reading '{path}': {message}")]
    Io { path: String, message: String },

    /// Failed to parse configuration
    #[error("{}", parse_message(.file, .message))]
    Parse {
        file: Option<String>,
        message: String,
    },
}

fn parse_message(file: &Option<String>, message: &str) -> String {
    match file {
        Some(file) => format!("Failed to parse config file '{}': {}", file, message),
        None => format!("Failed to parse config: {}", message),
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse {
            file: None,
            message: err.to_string(),
        }
    }
}

//! Wire transport seam for the platform REST API.
//!
//! # Responsibility
//! - Describe one API call independently of any HTTP library.
//! - Define the transport contract every handle in this crate goes through.
//! - Map wire failures into `ApiError`.
//!
//! # Invariants
//! - Path segments are carried decoded here; encoding is a transport concern.
//! - `ApiError::Rejected` always carries the HTTP status it came from.
//!
//! # See also
//! - docs/architecture/transport.md

pub mod http;
pub mod stub;

pub use http::HttpTransport;
pub use stub::{RecordedCall, StubTransport};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by every API-facing operation in this crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by API calls and by request construction.
#[derive(Debug)]
pub enum ApiError {
    /// Network-level failure: connect, TLS, timeout, interrupted body.
    Connection(reqwest::Error),
    /// The server answered with a non-success HTTP status.
    Rejected {
        /// HTTP status code of the rejection.
        status: u16,
        /// Server-provided message, or a capped excerpt of the raw body.
        message: String,
    },
    /// The response body does not match the expected shape.
    InvalidResponse(String),
    /// Client-side validation failed before any request was sent.
    InvalidRequest(String),
    /// The configured base URL cannot be used to build endpoints.
    InvalidBaseUrl(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "connection failed: {err}"),
            Self::Rejected { status, message } => {
                write!(f, "server rejected the call (HTTP {status}): {message}")
            }
            Self::InvalidResponse(details) => write!(f, "invalid server response: {details}"),
            Self::InvalidRequest(details) => write!(f, "invalid request: {details}"),
            Self::InvalidBaseUrl(details) => write!(f, "invalid base url: {details}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Connection(value)
    }
}

/// HTTP verb of one API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Uppercase verb name, as written in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One API call, described independently of the HTTP layer.
///
/// Handles build these with the verb constructors and hand them to a
/// [`Transport`]; nothing in a call references the server's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Decoded path segments, in order.
    pub segments: Vec<String>,
    /// Query string pairs, in append order.
    pub query: Vec<(String, String)>,
    /// JSON request body, when the call carries one.
    pub body: Option<Value>,
}

impl ApiCall {
    /// Starts a GET call on `segments`.
    pub fn get(segments: &[&str]) -> Self {
        Self::new(HttpMethod::Get, segments)
    }

    /// Starts a POST call on `segments`.
    pub fn post(segments: &[&str]) -> Self {
        Self::new(HttpMethod::Post, segments)
    }

    /// Starts a PUT call on `segments`.
    pub fn put(segments: &[&str]) -> Self {
        Self::new(HttpMethod::Put, segments)
    }

    /// Starts a DELETE call on `segments`.
    pub fn delete(segments: &[&str]) -> Self {
        Self::new(HttpMethod::Delete, segments)
    }

    fn new(method: HttpMethod, segments: &[&str]) -> Self {
        Self {
            method,
            segments: segments.iter().map(|segment| segment.to_string()).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends one query pair.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Slash-joined decoded path, without a leading slash.
    ///
    /// Used for log lines and stub call records, never for wire encoding.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

/// One file sent with a multipart upload call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name written into the multipart form.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

/// Contract between API handles and the wire.
///
/// [`HttpTransport`] talks to a live server; [`StubTransport`] replays canned
/// responses in tests. Handles never see URLs or HTTP types.
pub trait Transport {
    /// Performs one call and decodes the response body as JSON.
    fn perform_json(&self, call: &ApiCall) -> ApiResult<Value>;
    /// Performs one call and discards the response body.
    fn perform_empty(&self, call: &ApiCall) -> ApiResult<()>;
    /// Performs one multipart upload and decodes the response body as JSON.
    fn perform_upload(&self, call: &ApiCall, file: &UploadFile) -> ApiResult<Value>;
}

/// Decodes one JSON response into a typed document.
pub(crate) fn decode<T: DeserializeOwned>(context: &str, value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|err| {
        ApiError::InvalidResponse(format!("{context} document has an unexpected shape: {err}"))
    })
}

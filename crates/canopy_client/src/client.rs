//! Client entry point and connection settings.
//!
//! # Responsibility
//! - Hold the connection settings for one platform server.
//! - Build the blocking transport and hand out project handles.
//!
//! # Invariants
//! - One client owns exactly one transport for its whole lifetime.

use crate::project::Project;
use crate::transport::{ApiCall, ApiError, ApiResult, HttpTransport, Transport};
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for one platform server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, scheme and host included.
    pub base_url: String,
    /// API key sent as the basic-auth user name. `None` for open servers.
    pub api_key: Option<String>,
    /// Timeout applied to every call.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config with the default timeout and no API key.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Entry point for the project-level REST API of one server.
pub struct CanopyClient {
    transport: Box<dyn Transport>,
}

impl Debug for CanopyClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanopyClient").finish_non_exhaustive()
    }
}

impl CanopyClient {
    /// Opens a client over a blocking HTTP transport.
    ///
    /// # Errors
    /// - Returns `ApiError::InvalidBaseUrl` or `ApiError::Connection` when
    ///   the transport cannot be built. No request is sent here.
    pub fn open(config: &ClientConfig) -> ApiResult<Self> {
        let transport =
            HttpTransport::new(&config.base_url, config.api_key.clone(), config.timeout)?;
        Ok(Self::with_transport(Box::new(transport)))
    }

    /// Wraps an existing transport. Used by tests and offline wiring.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Returns a handle on one project. No call is made.
    pub fn project(&self, project_key: impl Into<String>) -> Project<'_> {
        Project::new(self, project_key.into())
    }

    /// Lists the keys of every project visible to this client.
    pub fn list_project_keys(&self) -> ApiResult<Vec<String>> {
        let value = self.transport.perform_json(&ApiCall::get(&["projects"]))?;
        let Value::Array(entries) = value else {
            return Err(ApiError::InvalidResponse(
                "project listing is not an array".to_string(),
            ));
        };
        let mut keys = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry
                .get("projectKey")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ApiError::InvalidResponse("project entry has no projectKey".to_string())
                })?;
            keys.push(key.to_string());
        }
        Ok(keys)
    }
}

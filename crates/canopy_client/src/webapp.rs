//! Webapp handles and backend state.
//!
//! # Responsibility
//! - Expose the backend lifecycle actions (stop, restart) and state reads.
//! - Parse listing entries into typed items.

use crate::client::CanopyClient;
use crate::transport::{ApiCall, ApiError, ApiResult};
use serde_json::Value;
use std::fmt::{Debug, Formatter};

/// One entry from the webapp listing.
pub struct WebappListItem<'a> {
    client: &'a CanopyClient,
    project_key: String,
    webapp_id: String,
    raw: Value,
}

impl Debug for WebappListItem<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebappListItem")
            .field("project_key", &self.project_key)
            .field("webapp_id", &self.webapp_id)
            .finish_non_exhaustive()
    }
}

impl<'a> WebappListItem<'a> {
    pub(crate) fn from_entry(
        client: &'a CanopyClient,
        project_key: String,
        raw: Value,
    ) -> ApiResult<Self> {
        let webapp_id = raw
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::InvalidResponse("webapp entry has no id".to_string()))?;
        Ok(Self {
            client,
            project_key,
            webapp_id,
            raw,
        })
    }

    /// Webapp id.
    pub fn webapp_id(&self) -> &str {
        &self.webapp_id
    }

    /// Display name.
    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    /// Display name of the user who created the webapp.
    pub fn owner(&self) -> Option<&str> {
        self.raw
            .get("createdBy")
            .and_then(|created_by| created_by.get("displayName"))
            .and_then(Value::as_str)
    }

    /// Whether the backend was running when the listing was taken.
    pub fn backend_running(&self) -> bool {
        self.raw
            .get("backendRunning")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Raw listing entry.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Full handle on this webapp.
    pub fn to_webapp(&self) -> Webapp<'a> {
        Webapp::new(self.client, self.project_key.clone(), self.webapp_id.clone())
    }
}

/// Handle on one webapp.
pub struct Webapp<'a> {
    client: &'a CanopyClient,
    project_key: String,
    webapp_id: String,
}

impl Debug for Webapp<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webapp")
            .field("project_key", &self.project_key)
            .field("webapp_id", &self.webapp_id)
            .finish_non_exhaustive()
    }
}

impl<'a> Webapp<'a> {
    pub(crate) fn new(client: &'a CanopyClient, project_key: String, webapp_id: String) -> Self {
        Self {
            client,
            project_key,
            webapp_id,
        }
    }

    /// Webapp id this handle points at.
    pub fn webapp_id(&self) -> &str {
        &self.webapp_id
    }

    /// Stops the backend. Returns the raw action descriptor.
    pub fn stop(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::put(&[
            "projects",
            self.project_key.as_str(),
            "webapps",
            self.webapp_id.as_str(),
            "backend",
            "actions",
            "stop",
        ]))
    }

    /// Restarts the backend. Returns the raw action descriptor.
    pub fn restart(&self) -> ApiResult<Value> {
        self.client.transport().perform_json(&ApiCall::put(&[
            "projects",
            self.project_key.as_str(),
            "webapps",
            self.webapp_id.as_str(),
            "backend",
            "actions",
            "restart",
        ]))
    }

    /// Fetches the current backend state.
    pub fn backend_state(&self) -> ApiResult<WebappBackendState> {
        let raw = self.client.transport().perform_json(&ApiCall::get(&[
            "projects",
            self.project_key.as_str(),
            "webapps",
            self.webapp_id.as_str(),
            "backend",
            "state",
        ]))?;
        Ok(WebappBackendState { raw })
    }
}

/// Backend state snapshot of one webapp.
#[derive(Debug, Clone, PartialEq)]
pub struct WebappBackendState {
    raw: Value,
}

impl WebappBackendState {
    /// Raw state document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Whether the backend process is alive.
    pub fn alive(&self) -> bool {
        self.raw
            .get("futureInfo")
            .and_then(|future_info| future_info.get("alive"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

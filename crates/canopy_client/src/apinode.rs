//! Prediction client for one deployed API service.
//!
//! # Responsibility
//! - Query the user-facing prediction endpoints of one service.
//! - Validate record shapes before any request leaves the process.

use crate::client::ClientConfig;
use crate::transport::{ApiCall, ApiError, ApiResult, HttpTransport, Transport};
use serde_json::{json, Map, Value};
use std::fmt::{Debug, Formatter};

/// Multi-version dispatch selector for prediction calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Route to one pinned model generation.
    ForcedGeneration(String),
    /// Route by dispatch key.
    Key(String),
}

impl Dispatch {
    fn to_value(&self) -> Value {
        match self {
            Self::ForcedGeneration(generation) => json!({ "forcedGeneration": generation }),
            Self::Key(key) => json!({ "dispatchKey": key }),
        }
    }
}

/// Entry point for the prediction API of one deployed service.
pub struct ApiNodeClient {
    transport: Box<dyn Transport>,
    service_id: String,
}

impl Debug for ApiNodeClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiNodeClient")
            .field("service_id", &self.service_id)
            .finish_non_exhaustive()
    }
}

impl ApiNodeClient {
    /// Opens a client over a blocking HTTP transport.
    ///
    /// # Errors
    /// - Returns `ApiError::InvalidBaseUrl` or `ApiError::Connection` when
    ///   the transport cannot be built. No request is sent here.
    pub fn open(config: &ClientConfig, service_id: impl Into<String>) -> ApiResult<Self> {
        let transport =
            HttpTransport::new(&config.base_url, config.api_key.clone(), config.timeout)?;
        Ok(Self::with_transport(Box::new(transport), service_id))
    }

    /// Wraps an existing transport. Used by tests and offline wiring.
    pub fn with_transport(transport: Box<dyn Transport>, service_id: impl Into<String>) -> Self {
        Self {
            transport,
            service_id: service_id.into(),
        }
    }

    /// Service this client queries.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Predicts one record on `endpoint_id`.
    ///
    /// `features` must be a JSON object. `context`, when given, rides along
    /// for server-side logging and does not affect the prediction.
    pub fn predict_record(
        &self,
        endpoint_id: &str,
        features: Value,
        context: Option<Value>,
        dispatch: Option<&Dispatch>,
    ) -> ApiResult<Value> {
        if !features.is_object() {
            return Err(ApiError::InvalidRequest(
                "features must be a JSON object".to_string(),
            ));
        }
        let mut body = Map::new();
        body.insert("features".to_string(), features);
        if let Some(context) = context {
            body.insert("context".to_string(), context);
        }
        if let Some(dispatch) = dispatch {
            body.insert("dispatch".to_string(), dispatch.to_value());
        }
        self.transport.perform_json(
            &ApiCall::post(&[
                "public",
                "api",
                "v1",
                self.service_id.as_str(),
                endpoint_id,
                "predict",
            ])
            .with_body(Value::Object(body)),
        )
    }

    /// Predicts a batch of records on `endpoint_id`.
    ///
    /// Every record must carry a `features` object. A malformed record fails
    /// the whole batch before any request is sent.
    pub fn predict_records(
        &self,
        endpoint_id: &str,
        records: Vec<Value>,
        dispatch: Option<&Dispatch>,
    ) -> ApiResult<Value> {
        for record in &records {
            if !record.get("features").map(Value::is_object).unwrap_or(false) {
                return Err(ApiError::InvalidRequest(
                    "each record must contain a `features` object".to_string(),
                ));
            }
        }
        let mut body = Map::new();
        body.insert("items".to_string(), Value::Array(records));
        if let Some(dispatch) = dispatch {
            body.insert("dispatch".to_string(), dispatch.to_value());
        }
        self.transport.perform_json(
            &ApiCall::post(&[
                "public",
                "api",
                "v1",
                self.service_id.as_str(),
                endpoint_id,
                "predict-multi",
            ])
            .with_body(Value::Object(body)),
        )
    }
}

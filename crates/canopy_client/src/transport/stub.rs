//! Canned in-memory transport for tests.
//!
//! # Responsibility
//! - Replay queued responses in FIFO order without touching the network.
//! - Record every performed call so tests can assert on the wire traffic.
//!
//! # Invariants
//! - A call is recorded even when the response queue is empty.
//! - Clones share one queue and one call record.

use super::{ApiCall, ApiError, ApiResult, HttpMethod, Transport, UploadFile};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// One call performed against a [`StubTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// HTTP verb of the call.
    pub method: HttpMethod,
    /// Slash-joined decoded path.
    pub path: String,
    /// Query pairs, in append order.
    pub query: Vec<(String, String)>,
    /// JSON body, when the call carried one.
    pub body: Option<Value>,
    /// Multipart file name, when the call was an upload.
    pub upload_file_name: Option<String>,
}

#[derive(Debug)]
enum StubResponse {
    Json(Value),
    Empty,
    Reject { status: u16, message: String },
}

#[derive(Debug, Default)]
struct StubState {
    responses: VecDeque<StubResponse>,
    calls: Vec<RecordedCall>,
}

/// Transport that replays canned responses and records calls.
///
/// Clone the stub before boxing it into a client; all clones share state, so
/// the original keeps access to the recorded calls.
#[derive(Clone, Debug, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    /// Creates a stub with an empty response queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn push_json(&self, value: Value) {
        self.lock().responses.push_back(StubResponse::Json(value));
    }

    /// Queues an empty (body-less) success response.
    pub fn push_empty(&self) {
        self.lock().responses.push_back(StubResponse::Empty);
    }

    /// Queues a rejection with an HTTP status and server message.
    pub fn push_rejection(&self, status: u16, message: impl Into<String>) {
        self.lock().responses.push_back(StubResponse::Reject {
            status,
            message: message.into(),
        });
    }

    /// Snapshot of every call performed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of queued responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        self.lock().responses.len()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        // A poisoned lock only means another test thread panicked; the state
        // itself stays usable.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_and_pop(
        &self,
        call: &ApiCall,
        upload_file_name: Option<String>,
    ) -> ApiResult<StubResponse> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            method: call.method,
            path: call.path(),
            query: call.query.clone(),
            body: call.body.clone(),
            upload_file_name,
        });
        state.responses.pop_front().ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "no stub response queued for {} /{}",
                call.method,
                call.path()
            ))
        })
    }
}

impl Transport for StubTransport {
    fn perform_json(&self, call: &ApiCall) -> ApiResult<Value> {
        match self.record_and_pop(call, None)? {
            StubResponse::Json(value) => Ok(value),
            StubResponse::Empty => Err(ApiError::InvalidResponse(
                "stub queued an empty response for a JSON call".to_string(),
            )),
            StubResponse::Reject { status, message } => Err(ApiError::Rejected { status, message }),
        }
    }

    fn perform_empty(&self, call: &ApiCall) -> ApiResult<()> {
        match self.record_and_pop(call, None)? {
            StubResponse::Json(_) | StubResponse::Empty => Ok(()),
            StubResponse::Reject { status, message } => Err(ApiError::Rejected { status, message }),
        }
    }

    fn perform_upload(&self, call: &ApiCall, file: &UploadFile) -> ApiResult<Value> {
        match self.record_and_pop(call, Some(file.file_name.clone()))? {
            StubResponse::Json(value) => Ok(value),
            StubResponse::Empty => Err(ApiError::InvalidResponse(
                "stub queued an empty response for an upload call".to_string(),
            )),
            StubResponse::Reject { status, message } => Err(ApiError::Rejected { status, message }),
        }
    }
}

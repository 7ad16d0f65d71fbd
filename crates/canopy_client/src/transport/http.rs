//! Blocking HTTP transport over reqwest.
//!
//! # Responsibility
//! - Turn [`ApiCall`] descriptions into real HTTP requests.
//! - Percent-encode path segments and attach auth, bodies, and uploads.
//! - Map HTTP failures and undecodable bodies into `ApiError`.
//!
//! # Invariants
//! - The API key never appears in a log line.
//! - Non-success statuses always surface as `ApiError::Rejected`.
//!
//! # See also
//! - docs/architecture/transport.md

use super::{ApiCall, ApiError, ApiResult, HttpMethod, Transport, UploadFile};
use crate::logging::sanitize_message;
use log::{debug, error};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

const MAX_REJECTION_BODY_CHARS: usize = 300;

/// Blocking transport for a live platform server.
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The key itself stays out, same policy as the log lines.
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Builds a transport for `base_url` with an optional API key.
    ///
    /// Trailing slashes on `base_url` are ignored. The key, when present, is
    /// sent as the basic-auth user name on every request.
    ///
    /// # Errors
    /// - Returns `ApiError::InvalidBaseUrl` when the URL does not parse or
    ///   cannot carry path segments.
    /// - Returns `ApiError::Connection` when the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> ApiResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|err| ApiError::InvalidBaseUrl(format!("`{trimmed}`: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(format!(
                "`{trimmed}` cannot carry path segments"
            )));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
            api_key,
        })
    }

    fn endpoint(&self, call: &ApiCall) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            for segment in &call.segments {
                segments.push(segment);
            }
        }
        for (key, value) in &call.query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    fn perform(&self, call: &ApiCall, file: Option<&UploadFile>) -> ApiResult<Response> {
        let started_at = Instant::now();
        let url = self.endpoint(call)?;
        debug!(
            "event=api_call module=transport status=start method={} path=/{}",
            call.method,
            call.path()
        );

        let mut request = match call.method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Put => self.http.put(url),
            HttpMethod::Delete => self.http.delete(url),
        };
        if let Some(api_key) = &self.api_key {
            request = request.basic_auth(api_key, None::<&str>);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }
        if let Some(file) = file {
            let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            request = request.multipart(Form::new().part("file", part));
        }

        let response = match request.send() {
            Ok(response) => response,
            Err(err) => {
                error!(
                    "event=api_call module=transport status=error method={} path=/{} duration_ms={} error={}",
                    call.method,
                    call.path(),
                    started_at.elapsed().as_millis(),
                    sanitize_message(&err.to_string(), MAX_REJECTION_BODY_CHARS)
                );
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let message = rejection_message(response);
            error!(
                "event=api_call module=transport status=rejected method={} path=/{} http_status={} duration_ms={}",
                call.method,
                call.path(),
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(
            "event=api_call module=transport status=ok method={} path=/{} http_status={} duration_ms={}",
            call.method,
            call.path(),
            status.as_u16(),
            started_at.elapsed().as_millis()
        );
        Ok(response)
    }
}

impl Transport for HttpTransport {
    fn perform_json(&self, call: &ApiCall) -> ApiResult<Value> {
        let response = self.perform(call, None)?;
        response
            .json::<Value>()
            .map_err(|err| ApiError::InvalidResponse(format!("body is not valid JSON: {err}")))
    }

    fn perform_empty(&self, call: &ApiCall) -> ApiResult<()> {
        self.perform(call, None)?;
        Ok(())
    }

    fn perform_upload(&self, call: &ApiCall, file: &UploadFile) -> ApiResult<Value> {
        let response = self.perform(call, Some(file))?;
        response
            .json::<Value>()
            .map_err(|err| ApiError::InvalidResponse(format!("body is not valid JSON: {err}")))
    }
}

/// Extracts the server's `message` field, falling back to a capped excerpt of
/// the raw body.
fn rejection_message(response: Response) -> String {
    let body = response.text().unwrap_or_default();
    if let Ok(value) = serde_json::from_str::<Value>(&body) {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    sanitize_message(&body, MAX_REJECTION_BODY_CHARS)
}

#[cfg(test)]
mod tests {
    use super::HttpTransport;
    use crate::transport::{ApiCall, ApiError};
    use std::time::Duration;

    fn transport(base_url: &str) -> HttpTransport {
        HttpTransport::new(base_url, None, Duration::from_secs(5))
            .expect("base url should be accepted")
    }

    #[test]
    fn new_rejects_unparseable_base_url() {
        let error = HttpTransport::new("not a url", None, Duration::from_secs(5))
            .expect_err("base url without a scheme must be rejected");
        assert!(matches!(error, ApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let transport = transport("https://canopy.example.com/api/");
        let call = ApiCall::get(&["projects", "PROJ", "wiki", "my article/v2"]);
        let url = transport.endpoint(&call).expect("endpoint should build");
        assert_eq!(
            url.as_str(),
            "https://canopy.example.com/api/projects/PROJ/wiki/my%20article%2Fv2"
        );
    }

    #[test]
    fn debug_output_reports_the_key_presence_but_not_the_key() {
        let transport = HttpTransport::new(
            "https://canopy.example.com",
            Some("secret-key".to_string()),
            Duration::from_secs(5),
        )
        .expect("base url should be accepted");

        let rendered = format!("{transport:?}");
        assert!(rendered.contains("has_api_key: true"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn endpoint_appends_query_pairs() {
        let transport = transport("https://canopy.example.com");
        let call = ApiCall::delete(&["projects", "PROJ", "datasets", "orders"])
            .with_query("dropData", "true");
        let url = transport.endpoint(&call).expect("endpoint should build");
        assert_eq!(
            url.as_str(),
            "https://canopy.example.com/projects/PROJ/datasets/orders?dropData=true"
        );
    }
}

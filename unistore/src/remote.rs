//! HTTP collaborator for flows that write results back into the store
//!
//! The store performs no I/O. Higher-level flows call a [`RemoteClient`],
//! then translate the tagged outcome into state through the normal
//! dispatch/batch paths - a failed request is data for an error field, not
//! a store error.
//!
//! # Example
//!
//! ```ignore
//! let client = RemoteClient::new("https://api.example.com/rpc")
//!     .with_timeout(Duration::from_secs(5));
//!
//! let bearer = store.field("token").and_then(Value::as_text).map(str::to_string);
//! match client.call::<_, SessionGrant>("session.login", &payload, bearer.as_deref()).await {
//!     RemoteOutcome::Success { payload: Some(grant), .. } => {
//!         store.batch_update(grant_update(grant))?;
//!     }
//!     RemoteOutcome::Success { payload: None, .. } => {
//!         store.dispatch("error", Value::Text("empty grant".into()))?;
//!     }
//!     RemoteOutcome::Failure { message } => {
//!         store.dispatch("error", Value::Text(message))?;
//!     }
//! }
//! ```

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a remote call, tagged success or failure.
///
/// Transport, HTTP, and decode errors all fold into `Failure` with a
/// human-readable message; this function family never surfaces an `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    /// The service accepted the call.
    Success {
        /// Typed payload, when the response carried one.
        payload: Option<T>,
        /// Optional human-readable note from the service.
        message: Option<String>,
    },
    /// The call did not succeed; `message` says why.
    Failure {
        /// Human-readable failure description.
        message: String,
    },
}

impl<T> RemoteOutcome<T> {
    /// Whether the call was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteOutcome::Success { .. })
    }

    /// The typed payload of a successful call, if any.
    pub fn into_payload(self) -> Option<T> {
        match self {
            RemoteOutcome::Success { payload, .. } => payload,
            RemoteOutcome::Failure { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a, P> {
    method: &'a str,
    payload: &'a P,
}

#[derive(Deserialize)]
struct ResponseEnvelope<T> {
    ok: bool,
    payload: Option<T>,
    message: Option<String>,
}

/// Async request collaborator: `{method, payload}` POSTs with a bearer
/// credential and a bounded timeout.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteClient {
    /// Create a client posting to `endpoint` with the default 10s timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `{"method": .., "payload": ..}` and decode the tagged response.
    ///
    /// `bearer` is attached as an `Authorization: Bearer` header when the
    /// caller read a credential out of store state. Timeouts, transport
    /// errors, non-success statuses, and undecodable bodies all come back
    /// as [`RemoteOutcome::Failure`].
    pub async fn call<P, T>(&self, method: &str, payload: &P, bearer: Option<&str>) -> RemoteOutcome<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let envelope = RequestEnvelope { method, payload };
        let mut request = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&envelope);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method, error = %e, "remote call failed");
                return RemoteOutcome::Failure {
                    message: e.to_string(),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(method, %status, "remote call rejected");
            return RemoteOutcome::Failure {
                message: format!("{} returned {}", method, status),
            };
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return RemoteOutcome::Failure {
                    message: e.to_string(),
                }
            }
        };
        match serde_json::from_str::<ResponseEnvelope<T>>(&body) {
            Ok(envelope) if envelope.ok => RemoteOutcome::Success {
                payload: envelope.payload,
                message: envelope.message,
            },
            Ok(envelope) => RemoteOutcome::Failure {
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("{} rejected by service", method)),
            },
            Err(e) => RemoteOutcome::Failure {
                message: format!("undecodable response: {}", e),
            },
        }
    }
}

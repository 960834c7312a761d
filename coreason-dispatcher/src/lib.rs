//! Per-source streaming transport: rewrites `sse(s)://` endpoint URLs, posts the intent,
//! and parses the server-sent-events response into a list of payloads (§4.5).

mod error;
mod sse;

use std::time::Duration;

use async_trait::async_trait;
use coreason_types::SourceManifest;
use futures::StreamExt;
use tracing::{error, info};

pub use error::DispatchError;
pub use sse::{parse_sse_body, SseEventParser};

/// Default connect+read timeout for the dispatcher's transport.
pub const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatch an intent to a single federated source and collect its streamed payloads.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, manifest: &SourceManifest, intent: &str) -> Result<Vec<serde_json::Value>, DispatchError>;

    /// Release the dispatcher's owned transport resources, if any. A dispatcher built over
    /// an externally owned client must make this a no-op.
    async fn close(&self) {}
}

fn rewrite_endpoint(endpoint_url: &str) -> String {
    if let Some(rest) = endpoint_url.strip_prefix("sse://") {
        format!("http://{rest}")
    } else if let Some(rest) = endpoint_url.strip_prefix("sses://") {
        format!("https://{rest}")
    } else {
        endpoint_url.to_string()
    }
}

/// Reference [`Dispatcher`]: POSTs `{"intent": ...}` to the rewritten endpoint and parses
/// the response body as a server-sent-events stream.
pub struct HttpSseDispatcher {
    client: reqwest::Client,
    owns_client: bool,
}

impl HttpSseDispatcher {
    /// Build a dispatcher that owns its transport client — `close()` releases it.
    pub fn new(timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::TransportIOError(e.to_string()))?;
        Ok(Self {
            client,
            owns_client: true,
        })
    }

    /// Build a dispatcher over an externally owned client — `close()` is a no-op.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            owns_client: false,
        }
    }
}

#[async_trait]
impl Dispatcher for HttpSseDispatcher {
    async fn dispatch(&self, manifest: &SourceManifest, intent: &str) -> Result<Vec<serde_json::Value>, DispatchError> {
        let url = rewrite_endpoint(&manifest.endpoint_url);
        info!(url = %url, urn = %manifest.urn, "dispatching to source");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "intent": intent }))
            .send()
            .await
            .map_err(|e| {
                error!(urn = %manifest.urn, error = %e, "transport error dispatching to source");
                DispatchError::TransportIOError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::TransportStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let mut parser = SseEventParser::new();
        let mut payloads = Vec::new();
        let mut carry = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DispatchError::TransportIOError(e.to_string()))?;
            carry.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = carry.find('\n') {
                let line = carry[..pos].trim_end_matches('\r').to_string();
                carry.drain(..=pos);
                if let Some(value) = parser.feed_line(&line) {
                    payloads.push(value);
                }
            }
        }

        if !carry.is_empty() {
            if let Some(value) = parser.feed_line(&carry) {
                payloads.push(value);
            }
        }
        if let Some(value) = parser.finish() {
            payloads.push(value);
        }

        Ok(payloads)
    }

    async fn close(&self) {
        // `reqwest::Client` is reference-counted internally; nothing to release explicitly
        // beyond dropping our handle, which happens regardless. This only matters as a
        // documented lifecycle hook for dispatchers over non-reqwest transports.
        if self.owns_client {
            info!("releasing dispatcher transport client");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manifest(endpoint_url: &str) -> SourceManifest {
        SourceManifest {
            urn: "urn:coreason:mcp:test".into(),
            name: "test".into(),
            description: "test".into(),
            endpoint_url: endpoint_url.to_string(),
            source_pointer: None,
            acls: BTreeSet::new(),
            geo_location: "US".into(),
            sensitivity: coreason_types::DataSensitivity::Public,
            owner_group: "team".into(),
            access_policy: "package match\nallow { true }".into(),
        }
    }

    #[test]
    fn rewrites_sse_scheme_to_http() {
        assert_eq!(rewrite_endpoint("sse://host:1/path"), "http://host:1/path");
    }

    #[test]
    fn rewrites_sses_scheme_to_https() {
        assert_eq!(rewrite_endpoint("sses://host:1/path"), "https://host:1/path");
    }

    #[tokio::test]
    async fn dispatches_and_parses_streamed_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"a\":1}\n\ndata: {\"a\":2}\n\n", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let dispatcher = HttpSseDispatcher::new(DEFAULT_TRANSPORT_TIMEOUT).unwrap();
        let endpoint = format!("sse://{}/query", server.address());
        let payloads = dispatcher.dispatch(&manifest(&endpoint), "find things").await.unwrap();
        assert_eq!(payloads, vec![serde_json::json!({"a": 1}), serde_json::json!({"a": 2})]);
    }

    #[tokio::test]
    async fn non_success_status_propagates_as_transport_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let dispatcher = HttpSseDispatcher::new(DEFAULT_TRANSPORT_TIMEOUT).unwrap();
        let endpoint = format!("sse://{}/query", server.address());
        let err = dispatcher.dispatch(&manifest(&endpoint), "find things").await.unwrap_err();
        assert!(matches!(err, DispatchError::TransportStatusError { status: 503, .. }));
    }

    #[tokio::test]
    async fn connect_failure_is_a_transport_io_error() {
        let dispatcher = HttpSseDispatcher::new(Duration::from_millis(200)).unwrap();
        let err = dispatcher
            .dispatch(&manifest("sse://127.0.0.1:1/query"), "find things")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::TransportIOError(_)));
    }
}

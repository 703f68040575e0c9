//! GraphQL-over-HTTP transport backed by `reqwest`.
//!
//! Posts `{ "query": ..., "variables": ... }` as JSON and decodes the
//! standard `{ "data": ..., "errors": [...] }` response envelope. A non-empty
//! `errors` list is surfaced verbatim as [`TransportError::Remote`].

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::Variables;
use crate::error::{RemoteError, TransportError};

use super::Transport;

/// An HTTP transport for textual query documents.
///
/// Works with any query descriptor that renders as a string (`&str`,
/// `String`, or a custom document type implementing `AsRef<str>`).
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport reusing an existing client, e.g. one configured
    /// with timeouts or custom headers.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    query: &'a str,
    variables: &'a Variables,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<RemoteError>>,
}

impl<Q> Transport<Q> for HttpTransport
where
    Q: AsRef<str> + Send + Sync,
{
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a Q,
        variables: &'a Variables,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            let request = self.client.post(endpoint).json(&WireRequest {
                query: query.as_ref(),
                variables,
            });

            // NOTE: biased so an already-canceled attempt never touches the
            // network.
            let response = tokio::select! {
                biased;
                () = token.cancelled() => return Err(TransportError::Canceled),
                outcome = request.send() => {
                    outcome.map_err(|e| TransportError::Network(e.to_string()))?
                }
            };

            let body = tokio::select! {
                biased;
                () = token.cancelled() => return Err(TransportError::Canceled),
                outcome = response.json::<WireResponse>() => {
                    outcome.map_err(|e| TransportError::Decode(e.to_string()))?
                }
            };

            if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
                return Err(TransportError::Remote(errors));
            }

            body.data.ok_or_else(|| {
                TransportError::Decode("response contained neither data nor errors".to_string())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canceled_token_short_circuits() {
        let transport = HttpTransport::new();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = transport
            .send(
                "http://127.0.0.1:0",
                &"query { countries { code } }",
                &Variables::new(),
                token,
            )
            .await;

        assert_eq!(outcome, Err(TransportError::Canceled));
    }

    #[test]
    fn test_wire_request_shape() {
        let mut variables = Variables::new();
        variables.insert("continent".to_string(), serde_json::json!("EU"));
        let body = serde_json::to_value(WireRequest {
            query: "query { countries { code } }",
            variables: &variables,
        })
        .expect("serializable request");

        assert_eq!(
            body,
            serde_json::json!({
                "query": "query { countries { code } }",
                "variables": {"continent": "EU"}
            })
        );
    }
}

//! Mock transport for deterministic tests.
//!
//! [`MockTransport`] replays a script of outcomes, one per call, and records
//! every request it receives, so tests can assert how many fetches were
//! issued, with which variables, and whether superseded attempts had their
//! tokens canceled.
//!
//! # Deferred completion
//!
//! [`MockTransport::hold`] enqueues an outcome the test resolves later
//! through a [`oneshot::Sender`], which is how supersession races are driven
//! deterministically: start a fetch, leave it parked, start a newer fetch,
//! then resolve the first and assert its completion is discarded.
//!
//! ```
//! use refetch::Variables;
//! use refetch::transport::{Transport, mock::MockTransport};
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = MockTransport::new();
//! transport.respond_ok(json!({"countries": []}));
//!
//! let outcome = transport
//!     .send("https://example.com", &"query", &Variables::new(), CancellationToken::new())
//!     .await;
//! assert!(outcome.is_ok());
//! assert_eq!(transport.call_count(), 1);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::Variables;
use crate::error::TransportError;

use super::Transport;

/// One request observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The endpoint the controller targeted.
    pub endpoint: String,
    /// The variables the fetch carried.
    pub variables: Variables,
    /// The attempt's cancellation token, for asserting supersession.
    pub token: CancellationToken,
}

enum MockOutcome {
    Reply(Result<Value, TransportError>),
    Hold {
        rx: oneshot::Receiver<Result<Value, TransportError>>,
        honor_cancel: bool,
    },
}

/// A transport that replays scripted outcomes and records calls.
///
/// Outcomes are consumed in FIFO order, one per `send`. A call arriving with
/// an exhausted script fails with a network error naming the problem, which
/// keeps accidental extra fetches visible in test assertions.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockOutcome>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts an immediate successful reply.
    pub fn respond_ok(&self, value: Value) {
        self.enqueue(MockOutcome::Reply(Ok(value)));
    }

    /// Scripts an immediate failure.
    pub fn respond_err(&self, error: TransportError) {
        self.enqueue(MockOutcome::Reply(Err(error)));
    }

    /// Scripts a parked outcome that honors cancellation.
    ///
    /// The matching `send` suspends until the returned sender resolves it or
    /// the attempt's token fires, whichever happens first; cancellation wins
    /// with [`TransportError::Canceled`].
    pub fn hold(&self) -> oneshot::Sender<Result<Value, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(MockOutcome::Hold {
            rx,
            honor_cancel: true,
        });
        tx
    }

    /// Scripts a parked outcome that ignores cancellation.
    ///
    /// Models a transport whose abort is only best-effort: the attempt
    /// completes with whatever the sender resolves even after its token was
    /// canceled, exercising the controller's staleness gate.
    pub fn hold_detached(&self) -> oneshot::Sender<Result<Value, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(MockOutcome::Hold {
            rx,
            honor_cancel: false,
        });
        tx
    }

    /// Returns every call observed so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of calls observed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn enqueue(&self, outcome: MockOutcome) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }
}

impl<Q> Transport<Q> for MockTransport {
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        _query: &'a Q,
        variables: &'a Variables,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedCall {
                    endpoint: endpoint.to_string(),
                    variables: variables.clone(),
                    token: token.clone(),
                });

            let outcome = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();

            match outcome {
                None => Err(TransportError::Network(
                    "mock transport script exhausted".to_string(),
                )),
                Some(MockOutcome::Reply(reply)) => reply,
                Some(MockOutcome::Hold {
                    rx,
                    honor_cancel: true,
                }) => {
                    tokio::select! {
                        () = token.cancelled() => Err(TransportError::Canceled),
                        reply = rx => reply.unwrap_or_else(|_| {
                            Err(TransportError::Network("mock resolver dropped".to_string()))
                        }),
                    }
                }
                Some(MockOutcome::Hold {
                    rx,
                    honor_cancel: false,
                }) => rx.await.unwrap_or_else(|_| {
                    Err(TransportError::Network("mock resolver dropped".to_string()))
                }),
            }
        })
    }
}

//! The request controller: one fetch at a time.
//!
//! [`RequestController`] owns the single live-attempt slot and the visible
//! query state. Starting a fetch cancels the predecessor's token, bumps the
//! attempt generation, publishes a pending transition, and spawns the
//! attempt on the Tokio runtime. Every completion is gated on a staleness
//! check: only the attempt whose generation still matches the live slot may
//! dispatch into the result state. Cancellation signals are swallowed and
//! never become visible.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::Variables;
use crate::error::TransportError;
use crate::state::{QueryState, Transition};
use crate::transport::Transport;

/// The single live-attempt slot.
///
/// `generation` identifies the most recently started attempt; a completing
/// attempt compares its own generation against this to detect supersession.
/// At most one token is live (present here) at any instant.
struct LiveAttempt {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Orchestrates fetch attempts for one query and publishes their outcomes.
pub struct RequestController<Q, V> {
    transport: Arc<dyn Transport<Q>>,
    endpoint: String,
    live: Arc<Mutex<LiveAttempt>>,
    tx: watch::Sender<QueryState<V>>,
}

impl<Q, V> RequestController<Q, V>
where
    Q: Send + Sync + 'static,
    V: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a controller targeting the given endpoint. The published
    /// state starts out pending.
    pub fn new(transport: Arc<dyn Transport<Q>>, endpoint: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(QueryState::Pending);
        Self {
            transport,
            endpoint: endpoint.into(),
            live: Arc::new(Mutex::new(LiveAttempt {
                generation: 0,
                token: None,
            })),
            tx,
        }
    }

    /// Subscribes to state changes. The receiver immediately holds the
    /// current state.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<V>> {
        self.tx.subscribe()
    }

    /// Starts a fetch attempt, superseding any attempt still in flight.
    ///
    /// Synchronously cancels the predecessor token, records the new attempt
    /// as live, and publishes [`Transition::Pending`]; the transport call
    /// itself runs on a spawned task. Must be called within a Tokio runtime.
    pub fn fetch(&self, query: Arc<Q>, variables: Arc<Variables>) {
        let (token, generation) = {
            let mut live = lock(&self.live);
            if let Some(previous) = live.token.take() {
                previous.cancel();
            }
            live.generation += 1;
            let token = CancellationToken::new();
            live.token = Some(token.clone());
            // Published under the lock so the pending transition and the
            // live-slot update are atomic with respect to completing
            // attempts.
            dispatch(&self.tx, Transition::Pending);
            (token, live.generation)
        };
        debug!(generation, "starting fetch attempt");

        let transport = self.transport.clone();
        let endpoint = self.endpoint.clone();
        let live = self.live.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = transport
                .send(&endpoint, query.as_ref(), variables.as_ref(), token.clone())
                .await;

            // The gate and the dispatch stay under one lock so a fetch
            // starting concurrently cannot interleave between them.
            let live = lock(&live);
            if live.generation != generation {
                trace!(generation, "attempt superseded, discarding completion");
                return;
            }

            match outcome {
                Ok(value) => match serde_json::from_value::<V>(value) {
                    Ok(data) => dispatch(&tx, Transition::Success(data)),
                    Err(e) => dispatch(
                        &tx,
                        Transition::Error(TransportError::Decode(e.to_string()).into_errors()),
                    ),
                },
                Err(TransportError::Canceled) => {
                    trace!(generation, "cancellation signal swallowed");
                }
                Err(error) => {
                    debug!(generation, %error, "fetch attempt failed");
                    dispatch(&tx, Transition::Error(error.into_errors()));
                }
            }
        });
    }
}

impl<Q, V> Drop for RequestController<Q, V> {
    /// Teardown: cancel the live token and invalidate the generation, so a
    /// late completion can never mutate state after the controller is gone.
    fn drop(&mut self) {
        let mut live = lock(&self.live);
        live.generation = live.generation.wrapping_add(1);
        if let Some(token) = live.token.take() {
            token.cancel();
        }
    }
}

fn lock(live: &Mutex<LiveAttempt>) -> MutexGuard<'_, LiveAttempt> {
    live.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dispatch<V>(tx: &watch::Sender<QueryState<V>>, transition: Transition<V>) {
    tx.send_modify(|state| *state = std::mem::take(state).apply(transition));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::transport::mock::MockTransport;
    use serde_json::{Value, json};
    use tokio::time::{Duration, timeout};

    fn controller(
        mock: Arc<MockTransport>,
    ) -> RequestController<&'static str, Value> {
        RequestController::new(mock, "https://example.com")
    }

    #[tokio::test]
    async fn test_fetch_publishes_pending_then_success() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_ok(json!({"ok": true}));
        let request = controller(mock);
        let mut rx = request.subscribe();

        request.fetch(Arc::new("query {}"), Arc::new(Variables::new()));
        assert!(rx.borrow().is_pending());

        let state = timeout(Duration::from_secs(1), rx.wait_for(QueryState::is_success))
            .await
            .expect("fetch resolves")
            .expect("controller alive")
            .clone();
        assert_eq!(state.data(), Some(&json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_failure_is_normalized() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_err(TransportError::Network("connection refused".to_string()));
        let request = controller(mock);
        let mut rx = request.subscribe();

        request.fetch(Arc::new("query {}"), Arc::new(Variables::new()));
        let state = timeout(Duration::from_secs(1), rx.wait_for(QueryState::is_error))
            .await
            .expect("fetch resolves")
            .expect("controller alive")
            .clone();
        assert_eq!(
            state.errors(),
            Some(&[RemoteError::new("connection refused")][..])
        );
    }

    #[tokio::test]
    async fn test_new_fetch_cancels_predecessor() {
        let mock = Arc::new(MockTransport::new());
        let _parked = mock.hold();
        mock.respond_ok(json!(2));
        let request = controller(mock.clone());
        let mut rx = request.subscribe();

        request.fetch(Arc::new("query {}"), Arc::new(Variables::new()));
        request.fetch(Arc::new("query {}"), Arc::new(Variables::new()));

        let state = timeout(Duration::from_secs(1), rx.wait_for(QueryState::is_success))
            .await
            .expect("second fetch resolves")
            .expect("controller alive")
            .clone();
        assert_eq!(state.data(), Some(&json!(2)));

        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 2);
        let canceled = recorded.iter().filter(|call| call.token.is_cancelled());
        assert_eq!(canceled.count(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload_becomes_error() {
        #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
        struct Typed {
            count: u32,
        }

        let mock = Arc::new(MockTransport::new());
        mock.respond_ok(json!({"count": "not a number"}));
        let request: RequestController<&str, Typed> =
            RequestController::new(mock, "https://example.com");
        let mut rx = request.subscribe();

        request.fetch(Arc::new("query {}"), Arc::new(Variables::new()));
        let state = timeout(Duration::from_secs(1), rx.wait_for(QueryState::is_error))
            .await
            .expect("fetch resolves")
            .expect("controller alive")
            .clone();
        assert!(state.is_error());
    }
}

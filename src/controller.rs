//! The query controller façade.
//!
//! [`QueryController`] wires input-change detection to the request
//! controller and exposes the merged result. Consumers call
//! [`evaluate`](QueryController::evaluate) whenever their inputs may have
//! changed; the controller decides whether that actually warrants a fetch.
//! For push-based consumption, [`subscribe`](QueryController::subscribe) and
//! [`states`](QueryController::states) notify on every visible state change.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::Variables;
use crate::config::ControllerConfig;
use crate::request::RequestController;
use crate::stable::{StableKey, StableSlot};
use crate::state::QueryState;
use crate::transport::Transport;

/// The public entry point: change detection, fetch orchestration, and the
/// merged three-state result for one query.
///
/// `Q` is the opaque query descriptor (never inspected, only compared and
/// handed to the transport); `V` is the typed result payload decoded from
/// the transport's raw value.
pub struct QueryController<Q, V> {
    request: RequestController<Q, V>,
    rx: watch::Receiver<QueryState<V>>,
    query_slot: StableSlot<Q>,
    variables_slot: StableSlot<Variables>,
    current: Option<(Arc<Q>, Arc<Variables>)>,
}

impl<Q, V> QueryController<Q, V>
where
    Q: StableKey + Send + Sync + 'static,
    V: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a controller for the configured endpoint. No fetch starts
    /// until the first [`evaluate`](Self::evaluate); the state is pending.
    pub fn new(config: ControllerConfig, transport: Arc<dyn Transport<Q>>) -> Self {
        let request = RequestController::new(transport, config.endpoint);
        let rx = request.subscribe();
        Self {
            request,
            rx,
            query_slot: StableSlot::new(),
            variables_slot: StableSlot::new(),
            current: None,
        }
    }

    /// Re-evaluates the inputs, fetching if either changed.
    ///
    /// Both inputs pass through their stable slots independently; a fetch
    /// starts only when a stabilized reference differs by identity from the
    /// pair that triggered the previous fetch. The very first evaluation
    /// always fetches. Returns the current state snapshot (pending
    /// immediately after a fetch starts).
    ///
    /// Must be called within a Tokio runtime.
    pub fn evaluate(&mut self, query: Q, variables: Variables) -> QueryState<V> {
        let query = self.query_slot.stabilize(query);
        let variables = self.variables_slot.stabilize(variables);

        let changed = match &self.current {
            None => true,
            Some((accepted_query, accepted_variables)) => {
                !Arc::ptr_eq(accepted_query, &query) || !Arc::ptr_eq(accepted_variables, &variables)
            }
        };
        if changed {
            self.current = Some((query.clone(), variables.clone()));
            self.request.fetch(query, variables);
        }

        self.query_slot.commit();
        self.variables_slot.commit();
        self.state()
    }

    /// Unconditionally re-fetches with the current stabilized inputs,
    /// bypassing change detection. Does nothing before the first
    /// [`evaluate`](Self::evaluate).
    pub fn refetch(&self) {
        if let Some((query, variables)) = &self.current {
            self.request.fetch(query.clone(), variables.clone());
        }
    }

    /// Returns the current state snapshot.
    #[must_use]
    pub fn state(&self) -> QueryState<V> {
        self.rx.borrow().clone()
    }

    /// Subscribes to state changes. The receiver immediately holds the
    /// current state; `wait_for` is the usual way to await an outcome.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<V>> {
        self.request.subscribe()
    }

    /// Returns the state changes as a stream, starting with the current
    /// state. Intermediate states may be skipped if the consumer lags; the
    /// latest state is always delivered.
    pub fn states(&self) -> WatchStream<QueryState<V>> {
        WatchStream::new(self.request.subscribe())
    }
}

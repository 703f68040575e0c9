//! Fault-injecting transport decorator.
//!
//! Wraps any [`Transport`] and fails a configurable fraction of sends with a
//! synthetic network error before the inner transport is invoked. This
//! exists to exercise the error path under test and demo conditions; it is
//! opt-in layering, never part of the production path unless explicitly
//! composed in.
//!
//! ```
//! use refetch::transport::chaos::{ChaosTransport, FaultPolicy};
//! use refetch::transport::mock::MockTransport;
//!
//! // Fail every fifth send on average, reproducibly.
//! let transport = ChaosTransport::seeded(MockTransport::new(), FaultPolicy::default(), 42);
//! # let _ = transport;
//! ```

use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Variables;
use crate::error::TransportError;

use super::Transport;

/// Default fraction of sends that fail synthetically.
pub const DEFAULT_FAULT_RATIO: f64 = 0.2;

/// When the decorator injects a fault.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaultPolicy {
    /// Pass every send through; the decorator is inert.
    Never,
    /// Fail every send.
    Always,
    /// Fail each send independently with the given probability in `0.0..=1.0`.
    Ratio(f64),
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self::Ratio(DEFAULT_FAULT_RATIO)
    }
}

/// A transport decorator that injects synthetic faults.
pub struct ChaosTransport<T> {
    inner: T,
    policy: FaultPolicy,
    rng: Mutex<StdRng>,
}

impl<T> ChaosTransport<T> {
    /// Wraps a transport with the default policy and an entropy-seeded RNG.
    pub fn new(inner: T) -> Self {
        Self::with_policy(inner, FaultPolicy::default())
    }

    /// Wraps a transport with the given policy and an entropy-seeded RNG.
    pub fn with_policy(inner: T, policy: FaultPolicy) -> Self {
        Self {
            inner,
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Wraps a transport with a deterministic RNG, for reproducible tests.
    pub fn seeded(inner: T, policy: FaultPolicy, seed: u64) -> Self {
        Self {
            inner,
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn should_fail(&self) -> bool {
        match self.policy {
            FaultPolicy::Never => false,
            FaultPolicy::Always => true,
            FaultPolicy::Ratio(ratio) => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                rng.gen::<f64>() < ratio
            }
        }
    }
}

impl<Q, T> Transport<Q> for ChaosTransport<T>
where
    Q: Sync,
    T: Transport<Q>,
{
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a Q,
        variables: &'a Variables,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            if self.should_fail() {
                debug!(endpoint, "injecting synthetic transport fault");
                return Err(TransportError::Network(
                    "synthetic fault injected".to_string(),
                ));
            }
            self.inner.send(endpoint, query, variables, token).await
        })
    }
}

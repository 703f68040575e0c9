//! The transport seam: the external collaborator that performs the actual
//! network call.
//!
//! The core never interprets a query descriptor; it hands (endpoint, query,
//! variables, token) to a [`Transport`] and awaits the outcome. Three
//! implementations ship with the crate:
//!
//! - [`http::HttpTransport`]: GraphQL-over-HTTP via `reqwest`
//! - [`mock::MockTransport`]: scripted transport for deterministic tests
//! - [`chaos::ChaosTransport`]: fault-injecting decorator for exercising the
//!   error path under test and demo conditions

pub mod chaos;
pub mod http;
pub mod mock;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::Variables;
use crate::error::TransportError;

/// An asynchronous transport for query descriptors of type `Q`.
///
/// Implementations should observe `token` for cooperative abort and fail
/// with [`TransportError::Canceled`] once it fires. Cancellation is
/// best-effort: controller correctness does not depend on the transport
/// aborting promptly, only on it eventually completing. Any deadline
/// enforcement is the transport's responsibility.
pub trait Transport<Q>: Send + Sync {
    /// Sends the query with its variables to the endpoint, resolving to the
    /// raw result payload or a transport error.
    fn send<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a Q,
        variables: &'a Variables,
        token: CancellationToken,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;
}

//! Error types for query operations.
//!
//! Failures fall into three categories:
//!
//! - **Transport failures** ([`TransportError::Network`], [`TransportError::Decode`]):
//!   connectivity or protocol-level problems, surfaced as an error state.
//! - **Remote error sets** ([`TransportError::Remote`]): structured errors
//!   returned by the remote service itself, surfaced verbatim.
//! - **Cancellation** ([`TransportError::Canceled`]): never user-visible;
//!   the request controller swallows it before it can reach the result store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A structured error object returned by the remote service.
///
/// Mirrors the wire shape of GraphQL-style error lists: a human-readable
/// message plus optional source locations and a response path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Human-readable description of the error.
    pub message: String,

    /// Positions in the query document the error refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,

    /// Path to the response field the error is associated with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

impl RemoteError {
    /// Creates an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
        }
    }
}

/// A line/column position in a query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Error type for transport operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connectivity-level failure (DNS, TCP, TLS, HTTP).
    #[error("network error: {0}")]
    Network(String),

    /// The response arrived but could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The remote service answered with a structured error set.
    #[error("remote service returned {} error(s)", .0.len())]
    Remote(Vec<RemoteError>),

    /// The attempt was canceled. Swallowed at the request controller
    /// boundary, never dispatched into the result store.
    #[error("request canceled")]
    Canceled,
}

impl TransportError {
    /// Normalizes this failure into the structured error list surfaced to
    /// consumers.
    ///
    /// Remote error sets pass through verbatim; transport-level failures are
    /// wrapped into a single-element list. `Canceled` is total here for
    /// completeness but is filtered out before normalization in practice.
    pub fn into_errors(self) -> Vec<RemoteError> {
        match self {
            Self::Remote(errors) => errors,
            Self::Network(message) | Self::Decode(message) => vec![RemoteError::new(message)],
            Self::Canceled => vec![RemoteError::new("request canceled")],
        }
    }
}

//! Prelude module for convenient imports.
//!
//! ```
//! use refetch::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`QueryController`] - The public entry point
//! - [`ControllerConfig`] - Endpoint configuration
//! - [`QueryState`] / [`Transition`] - The three-state result and its transitions
//! - [`Transport`] - The network-call seam
//! - [`TransportError`] / [`RemoteError`] - The failure taxonomy
//! - [`Variables`] - Named query inputs

pub use crate::Variables;
pub use crate::config::ControllerConfig;
pub use crate::controller::QueryController;
pub use crate::error::{RemoteError, TransportError};
pub use crate::state::{QueryState, Transition};
pub use crate::transport::Transport;

//! # Refetch - Reactive Query Controller
//!
//! Refetch manages the lifecycle of asynchronous remote fetches bound to a
//! reactive consumer, similar in spirit to SWR or TanStack Query. Given an
//! opaque query descriptor and a set of variables, it:
//!
//! 1. **Deduplicates** redundant fetches when inputs are semantically unchanged
//! 2. **Cancels** superseded in-flight fetches
//! 3. Exposes a three-state result (pending / success / error)
//! 4. Provides a manual `refetch` operation bypassing change detection
//!
//! ## Core Components
//!
//! - [`QueryController`](controller::QueryController): The public entry point
//! - [`RequestController`](request::RequestController): Orchestrates one fetch at a time
//! - [`StableSlot`](stable::StableSlot): Suppresses spurious re-fetch triggers
//! - [`QueryState`](state::QueryState): The three-state result
//! - [`Transport`](transport::Transport): The external collaborator performing the network call
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! use refetch::prelude::*;
//! use refetch::transport::mock::MockTransport;
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct AllCountries {
//!     countries: Vec<Country>,
//! }
//!
//! #[derive(Debug, Clone, Deserialize)]
//! struct Country {
//!     code: String,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = Arc::new(MockTransport::new());
//!     transport.respond_ok(json!({
//!         "countries": [{"code": "US", "name": "United States"}]
//!     }));
//!
//!     let config = ControllerConfig::new("https://example.com/graphql");
//!     let mut controller: QueryController<&str, AllCountries> =
//!         QueryController::new(config, transport);
//!
//!     let mut updates = controller.subscribe();
//!     controller.evaluate("query { countries { code name } }", Variables::new());
//!
//!     let state = updates
//!         .wait_for(|state| !state.is_pending())
//!         .await
//!         .expect("controller dropped")
//!         .clone();
//!     println!("{state:?}");
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! Fetch attempts are spawned Tokio tasks that suspend only at the transport
//! boundary. Starting a new fetch always cancels the previous attempt's
//! [`CancellationToken`](tokio_util::sync::CancellationToken) before the new
//! one becomes live, so there is never more than one live attempt per
//! controller. A generation-based staleness check additionally prevents a
//! best-effort-canceled predecessor that completes anyway from overwriting a
//! newer fetch's result.

pub mod config;
pub mod controller;
pub mod error;
pub mod prelude;
pub mod request;
pub mod stable;
pub mod state;
pub mod transport;

/// Named inputs for a query, compared by structural equality.
///
/// An empty map means the query takes no inputs. Values are arbitrary JSON;
/// two maps with the same entries are considered equal regardless of
/// insertion order.
pub type Variables = serde_json::Map<String, serde_json::Value>;

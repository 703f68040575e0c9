//! The three-state query result and its reducer.
//!
//! [`QueryState`] is a tagged union over exactly three states: pending,
//! success, and error. Exactly one tag is active at any time; data exists
//! only in `Success` and errors only in `Error`. State changes happen
//! exclusively through [`QueryState::apply`], a pure reducer over
//! [`Transition`] values dispatched by the request controller.

use crate::error::RemoteError;

/// The externally visible state of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// A fetch is in flight (or none has been started yet). No error, no
    /// data.
    Pending,
    /// The most recent fetch resolved successfully.
    Success {
        /// The decoded result payload.
        data: T,
    },
    /// The most recent fetch failed with a non-cancellation error.
    Error {
        /// The structured errors describing the failure.
        errors: Vec<RemoteError>,
    },
}

/// A state transition dispatched by the request controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    /// A new fetch has started.
    Pending,
    /// A fetch resolved with a decoded payload.
    Success(T),
    /// A fetch failed; carries the normalized error list.
    Error(Vec<RemoteError>),
}

impl<T> QueryState<T> {
    /// Applies a transition, producing the next state.
    ///
    /// Pure and total. Every transition fully replaces the visible state, so
    /// no partial combination of tag, data, and errors can ever be observed:
    /// entering `Pending` clears a previous error, `Success` clears errors,
    /// and `Error` clears data.
    pub fn apply(self, transition: Transition<T>) -> Self {
        match transition {
            Transition::Pending => Self::Pending,
            Transition::Success(data) => Self::Success { data },
            Transition::Error(errors) => Self::Error { errors },
        }
    }

    /// Returns the data if the query succeeded, otherwise `None`.
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data } => Some(data),
            _ => None,
        }
    }

    /// Returns the error list if the query failed, otherwise `None`.
    pub fn errors(&self) -> Option<&[RemoteError]> {
        match self {
            Self::Error { errors } => Some(errors),
            _ => None,
        }
    }

    /// Returns `true` if a fetch is in flight or none has started.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` if the most recent fetch succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` if the most recent fetch failed.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl<T> Default for QueryState<T> {
    /// A query starts out pending; the state machine is live for the
    /// controller's whole lifetime and has no terminal state.
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_pending() {
        let state: QueryState<i32> = QueryState::default();
        assert!(state.is_pending());
        assert_eq!(state.data(), None);
        assert_eq!(state.errors(), None);
    }

    #[test]
    fn test_success_transition_sets_data() {
        let state = QueryState::default().apply(Transition::Success(42));
        assert!(state.is_success());
        assert_eq!(state.data(), Some(&42));
        assert_eq!(state.errors(), None);
    }

    #[test]
    fn test_error_transition_clears_data() {
        let state = QueryState::default()
            .apply(Transition::Success(42))
            .apply(Transition::Error(vec![RemoteError::new("boom")]));
        assert!(state.is_error());
        assert_eq!(state.data(), None);
        assert_eq!(state.errors(), Some(&[RemoteError::new("boom")][..]));
    }

    #[test]
    fn test_pending_transition_clears_error() {
        let state: QueryState<i32> = QueryState::default()
            .apply(Transition::Error(vec![RemoteError::new("boom")]))
            .apply(Transition::Pending);
        assert!(state.is_pending());
        assert_eq!(state.errors(), None);
    }

    #[test]
    fn test_exactly_one_tag_active() {
        let pending: QueryState<i32> = QueryState::Pending;
        assert!(pending.is_pending() && !pending.is_success() && !pending.is_error());

        let success = QueryState::Success { data: 42 };
        assert!(!success.is_pending() && success.is_success() && !success.is_error());

        let error: QueryState<i32> = QueryState::Error {
            errors: vec![RemoteError::new("boom")],
        };
        assert!(!error.is_pending() && !error.is_success() && error.is_error());
    }
}

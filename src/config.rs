//! Controller configuration.

/// Configuration for a query controller.
///
/// The endpoint is injected per instance rather than read from a process-wide
/// constant, so independent controllers (and tests) can target different
/// services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// The endpoint handed to the transport on every fetch.
    pub endpoint: String,
}

impl ControllerConfig {
    /// Creates a configuration targeting the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = ControllerConfig::new("https://countries.trevorblades.com");
        assert_eq!(config.endpoint, "https://countries.trevorblades.com");
    }
}

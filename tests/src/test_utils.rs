//! Shared setup for the integration suite

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a test-writer subscriber so traced round logs land in the
/// captured output of the test that produced them.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        // A second call must not panic even though a subscriber is set
        init_test_logging();
    }
}

//! Logging configuration for sqldeploy.
//!
//! Diagnostics go to stderr so stdout stays reserved for the run summary.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Initializes logging to stderr.
///
/// `verbose` lowers the default level to `debug`, which shows every
/// candidate attempt made by the executor.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the env filter, honoring `RUST_LOG` when present.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { DEFAULT_FILTER })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_builds() {
        // Only checks construction; the active level depends on RUST_LOG.
        let filter = env_filter(false);
        assert!(!filter.to_string().is_empty());
    }
}

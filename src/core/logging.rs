//! Tracing/logging initialization
//!
//! Diagnostics go to stderr so stdout stays clean for piped output.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize tracing for the process.
///
/// `RUST_LOG` wins over the flags. Safe to call multiple times (subsequent
/// calls are no-ops).
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(true, true), "error");
    }

    #[test]
    fn test_init_twice_is_noop() {
        init(false, true);
        init(true, false);
    }
}

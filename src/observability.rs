//! Observability utilities.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initializes a compact `tracing` subscriber once for the process.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // A global subscriber installed elsewhere takes precedence.
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact())
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}

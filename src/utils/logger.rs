//! Tracing setup for the snapvault binary.
//!
//! The CLI level is a fallback; `RUST_LOG` takes precedence so operators
//! can raise verbosity for a single module during debugging.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `level` comes from the `--log-level` flag
/// and is used when `RUST_LOG` is unset or unparsable.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

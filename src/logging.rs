//! Structured logging setup.
//!
//! Logs go to stderr. The level defaults to `lede=warn`; `--verbose` raises
//! it to `lede=debug`, `--log-level` sets it explicitly, and `LEDE_LOG` or
//! `RUST_LOG` override everything.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber from CLI flags.
pub fn init_tracing(verbose: bool, log_level: Option<&str>, log_json: bool) -> Result<()> {
    let level = match (verbose, log_level) {
        (_, Some(level)) => filter_directive(level),
        (true, None) => "lede=debug".to_string(),
        (false, None) => "lede=warn".to_string(),
    };

    let filter = EnvFilter::try_from_env("LEDE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}

/// `debug` → `lede=debug`; full directives pass through.
fn filter_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("lede={}", level)
    }
}

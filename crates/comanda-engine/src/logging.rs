//! Tracing bootstrap.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - everything at debug
//! - `RUST_LOG=comanda_engine=trace` - one crate only
//! - otherwise the configured filter (default `info,comanda=debug,sqlx=warn`)

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` wins over `fallback`.
///
/// Calling it twice is harmless: the second install is ignored.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing("warn");
        init_tracing("debug");
        tracing::info!("still alive");
    }
}

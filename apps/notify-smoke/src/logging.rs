//! Tracing bootstrap for the smoke runner.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,notify_smoke=debug,notify_core=debug";

/// Initialize the global tracing subscriber.
///
/// Filter precedence:
/// 1) `RUST_LOG`
/// 2) `NOTIFY_SMOKE_LOG`
/// 3) `NOTIFY_LOG`
/// 4) internal default filter
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_env_filter(filter_from_env())
        .try_init();
}

fn filter_from_env() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    for key in ["NOTIFY_SMOKE_LOG", "NOTIFY_LOG"] {
        if let Some(value) = env::var(key).ok().filter(|v| !v.trim().is_empty())
            && let Ok(filter) = EnvFilter::try_new(value)
        {
            return filter;
        }
    }

    EnvFilter::new(DEFAULT_FILTER)
}

//! JSON log subscriber driven by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install JSON logs with timestamps and span context.
///
/// Returns `false` when a global subscriber was already set, which happens
/// whenever several tests in one binary each call this.
pub fn init() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .json()
        .with_current_span(true)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        ::tracing::debug!(filter = DEFAULT_FILTER, "tracing initialised");
    }
    installed
}

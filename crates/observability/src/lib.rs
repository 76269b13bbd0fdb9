//! Process-wide tracing setup shared by binaries and integration tests.

pub mod tracing;

/// Install the global subscriber. Repeated calls are no-ops.
pub fn init() {
    tracing::init();
}

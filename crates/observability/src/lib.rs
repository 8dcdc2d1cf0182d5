//! Process-wide logging setup shared by the binaries.

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber construction (filter and output format).
pub mod tracing;

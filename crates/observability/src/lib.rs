//! Logging setup shared by every casedesk binary and test harness.

/// Initialize process-wide tracing with the format chosen by the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, formatters).
pub mod tracing;

use crate::logging::LogFormat;

/// Program name inserted ahead of single-string argument forms.
pub const PROGRAM_NAME: &str = "vcsbridge";

/// Default log filter expression used by the bridge binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Implicit reconnect attempts made before a backend command fails fast.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 1;

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the bridge binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default number of implicit reconnect attempts.
#[must_use]
pub const fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}

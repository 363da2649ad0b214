//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Finalizer attached to every CopyRequest before its object is written
pub const FINALIZER: &str = "s3-copy.octopilot.io/finalizer";

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "s3-copy-controller";

/// Event reporter name shown as the event source
pub const EVENT_REPORTER: &str = "s3-copy-controller";

/// Event reason for a failed store or delete
pub const REASON_FAILED: &str = "Failed";

/// Event reason for an object written to the backend
pub const REASON_SYNCED: &str = "Synced";

/// Event reason for an object removed from the backend
pub const REASON_REMOVED: &str = "Removed";

/// Event reason for an object left in place by `deletionPolicy: retain`
pub const REASON_RETAINED: &str = "Retained";

/// URI scheme used for `status.reference`
pub const REFERENCE_SCHEME: &str = "s3";

/// Profile read from the credentials INI document
pub const CREDENTIALS_PROFILE: &str = "default";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default minimum per-resource error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 5;

/// Default maximum per-resource error backoff (seconds)
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 300;

/// Default watch stream backoff starting value (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default watch stream backoff maximum value (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 30_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default upper bound on a single backend call (seconds)
pub const DEFAULT_BACKEND_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default namespace the controller runs in
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "octopilot-system";

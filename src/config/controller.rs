//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::provider::BackendKind;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to bind (seconds)
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// First per-resource retry delay after a failed reconciliation (seconds)
    pub error_backoff_min_secs: u64,
    /// Cap on the per-resource retry delay (seconds)
    pub error_backoff_max_secs: u64,
    /// Watch stream backoff starting value (milliseconds)
    pub backoff_start_ms: u64,
    /// Watch stream backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after the stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Namespace to watch, all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Object store backend (`s3` or `memory`)
    pub backend: BackendKind,
    /// Upper bound on a single backend call (seconds)
    pub backend_operation_timeout_secs: u64,
    /// Custom S3 endpoint for S3-compatible stores
    pub s3_endpoint_url: Option<String>,
    /// Namespace where the controller is deployed
    pub controller_namespace: String,
    /// Pod name, used as the event reporter instance
    pub pod_name: Option<String>,
    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            error_backoff_min_secs: DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: DEFAULT_ERROR_BACKOFF_MAX_SECS,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            watch_namespace: None,
            backend: BackendKind::S3,
            backend_operation_timeout_secs: DEFAULT_BACKEND_OPERATION_TIMEOUT_SECS,
            s3_endpoint_url: None,
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            pod_name: None,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let error_backoff_min_secs =
            parsed("ERROR_BACKOFF_MIN_SECS", defaults.error_backoff_min_secs).max(1);
        let error_backoff_max_secs = parsed("ERROR_BACKOFF_MAX_SECS", defaults.error_backoff_max_secs)
            .max(error_backoff_min_secs);

        Self {
            metrics_port: lookup("METRICS_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.metrics_port),
            server_startup_timeout_secs: parsed(
                "SERVER_STARTUP_TIMEOUT_SECS",
                defaults.server_startup_timeout_secs,
            ),
            server_poll_interval_ms: parsed(
                "SERVER_POLL_INTERVAL_MS",
                defaults.server_poll_interval_ms,
            ),
            error_backoff_min_secs,
            error_backoff_max_secs,
            backoff_start_ms: parsed("BACKOFF_START_MS", defaults.backoff_start_ms),
            backoff_max_ms: parsed("BACKOFF_MAX_MS", defaults.backoff_max_ms),
            watch_restart_delay_secs: parsed(
                "WATCH_RESTART_DELAY_SECS",
                defaults.watch_restart_delay_secs,
            ),
            watch_restart_delay_after_end_secs: parsed(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                defaults.watch_restart_delay_after_end_secs,
            ),
            watch_namespace: optional("WATCH_NAMESPACE"),
            backend: lookup("OBJECT_STORE_BACKEND")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.backend),
            backend_operation_timeout_secs: parsed(
                "BACKEND_OPERATION_TIMEOUT_SECS",
                defaults.backend_operation_timeout_secs,
            ),
            s3_endpoint_url: optional("S3_ENDPOINT_URL"),
            controller_namespace: optional("POD_NAMESPACE")
                .unwrap_or(defaults.controller_namespace),
            pod_name: optional("POD_NAME"),
            log_level: optional("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: optional("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Get backend operation timeout duration
    pub fn backend_operation_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_operation_timeout_secs)
    }

    /// Get watch restart delay duration
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}

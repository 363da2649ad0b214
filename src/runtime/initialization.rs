//! # Initialization
//!
//! Controller startup: rustls, logging, metrics, the health server and the
//! Kubernetes client, ending with a ready-to-run [`Reconciler`].

use crate::cluster::{KubeEventSink, KubeLookup, KubeResourceStore};
use crate::config::ControllerConfig;
use crate::constants::{EVENT_REPORTER, FIELD_MANAGER};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::CopyRequest;
use crate::observability::{self, logging::LogFormat};
use crate::provider::{DefaultBackendFactory, S3Settings};
use anyhow::{Context, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for the watched CopyRequests
    pub requests: Api<CopyRequest>,
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime from environment configuration
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything touches rustls
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    let config = ControllerConfig::from_env();
    observability::logging::init_logging(&config.log_level, LogFormat::parse(&config.log_format))
        .context("Failed to initialize logging")?;

    info!("Starting S3 copy controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        "Object store backend: {}, watch namespace: {}",
        config.backend,
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = server_state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(
        &server_state,
        &server_handle,
        Duration::from_secs(config.server_startup_timeout_secs),
        Duration::from_millis(config.server_poll_interval_ms),
    )
    .await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let requests: Api<CopyRequest> = match config.watch_namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    let backends = DefaultBackendFactory::new(
        config.backend,
        S3Settings {
            operation_timeout: Some(config.backend_operation_timeout()),
            endpoint_url: config.s3_endpoint_url.clone(),
        },
    );

    let reconciler = Reconciler::new(
        Arc::new(KubeResourceStore::new(client.clone(), FIELD_MANAGER)),
        Arc::new(KubeLookup::new(client.clone())),
        Arc::new(KubeLookup::new(client.clone())),
        Arc::new(backends),
        Arc::new(KubeEventSink::new(
            client.clone(),
            EVENT_REPORTER,
            config.pod_name.clone(),
        )),
    )
    .with_backoff(config.error_backoff_min_secs, config.error_backoff_max_secs);

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        requests,
        reconciler: Arc::new(reconciler),
        server_state,
        config,
    })
}

/// Wait for the HTTP server to bind before reconciling anything
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    startup_timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

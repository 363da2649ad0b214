//! # Watch Loop
//!
//! Runs the kube controller over CopyRequests and restarts it when the watch
//! stream ends.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::CopyRequest;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::{watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the controller until a shutdown signal arrives
pub async fn run_watch_loop(
    requests: Api<CopyRequest>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    let backoff_ms = Arc::new(AtomicU64::new(config.backoff_start_ms));
    let backoff_start_ms = config.backoff_start_ms;
    let max_backoff_ms = config.backoff_max_ms;
    let restart_delay = config.watch_restart_delay_duration();

    // Readiness goes false as soon as a shutdown signal arrives
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.set_ready(false);
    });

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let backoff = backoff_ms.clone();
        let watch_span = tracing::info_span!("controller.watch", operation = "watch_loop");

        async {
            info!("Starting controller watch...");
            Controller::new(requests.clone(), watcher::Config::default().any_semantic())
                .shutdown_on_signal()
                .run(reconcile, handle_reconciliation_error, reconciler.clone())
                .filter_map(move |event| {
                    let backoff = backoff.clone();
                    async move {
                        match &event {
                            Ok((object, _)) => {
                                backoff.store(backoff_start_ms, Ordering::Relaxed);
                                debug!("Reconciled {}", object.name);
                                Some(event)
                            }
                            Err(e) => {
                                let rendered = format!("{e:?}");
                                handle_watch_stream_error(
                                    &rendered,
                                    &backoff,
                                    max_backoff_ms,
                                    restart_delay,
                                )
                                .await
                                .then_some(event)
                            }
                        }
                    }
                })
                .for_each(|_| futures::future::ready(()))
                .await;
        }
        .instrument(watch_span)
        .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = config.watch_restart_delay_after_end_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

//! # S3 Copy Controller
//!
//! Kubernetes controller that copies inline or ConfigMap content into S3
//! objects declared by `CopyRequest` resources.

use anyhow::Result;
use s3_copy_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.requests,
        init.reconciler,
        init.server_state,
        &init.config,
    )
    .await
}

//! Motherstream Orchestrator: single-output live-stream rotation service.
//!
//! Ties together the Queue, Stream Manager, Job Worker, Compositor Client,
//! and Health Monitor behind the Ingest Control Surface's HTTP RPC.

use anyhow::Result;
use motherstream_orchestrator::{config::Args, Orchestrator};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motherstream_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true).with_file(true).with_line_number(true))
        .init();

    info!("starting motherstream-orchestrator");

    let args = Args::load()?;
    let port = args.http_port;

    let orchestrator = Orchestrator::build(&args).await?;
    info!("orchestrator ready, serving on port {port}");

    let server_result = motherstream_orchestrator::api::run(port, orchestrator.app_state.clone()).await;

    orchestrator.shutdown().await;
    server_result?;

    Ok(())
}

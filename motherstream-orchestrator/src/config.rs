//! Configuration loading and management
//!
//! All settings are read once at startup from environment variables, with
//! command-line flags as overrides. Missing required variables abort
//! startup; everything else has a documented default.

use crate::error::{OrchestratorError, Result};
use clap::Parser;
use std::path::PathBuf;

fn default_swap_interval_secs() -> u64 {
    // Fixed at the Stream Manager; see design note (c) about a conflicting
    // 15s constant elsewhere in the original source, which we do not carry.
    12_000
}

fn default_obs_job_delay_ms() -> u64 {
    2_000
}

fn default_health_poll_interval_secs() -> f64 {
    1.0
}

fn default_compositor_max_reconnect_failures() -> u32 {
    5
}

/// Command-line / environment configuration for the orchestrator.
#[derive(Parser, Debug, Clone)]
#[command(name = "motherstream-orchestrator")]
#[command(about = "Single-output live-stream rotation orchestrator")]
#[command(version)]
pub struct Args {
    /// HTTP port for the ingest control surface and admin API
    #[arg(long, env = "MOTHERSTREAM_HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// Scene compositor WebSocket host
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_HOST")]
    pub compositor_host: String,

    /// Scene compositor WebSocket port
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_PORT")]
    pub compositor_port: u16,

    /// Scene compositor auth credential, if the wire protocol requires one
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_PASSWORD")]
    pub compositor_password: Option<String>,

    /// Name of the scene the compositor mixes the motherstream source into
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_SCENE", default_value = "Motherstream")]
    pub compositor_scene: String,

    /// Name of the source inside that scene bound to the live RTMP input
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_SOURCE", default_value = "LiveInput")]
    pub compositor_source: String,

    /// Consecutive reconnect failures before the compositor client goes
    /// unhealthy and starts failing fast
    #[arg(long, env = "MOTHERSTREAM_COMPOSITOR_MAX_RECONNECT_FAILURES", default_value_t = default_compositor_max_reconnect_failures())]
    pub compositor_max_reconnect_failures: u32,

    /// Ingest RTMP server host, used to build kick-publisher/recording URLs
    #[arg(long, env = "MOTHERSTREAM_INGEST_HOST")]
    pub ingest_host: String,

    /// Ingest RTMP server port
    #[arg(long, env = "MOTHERSTREAM_INGEST_RTMP_PORT", default_value_t = 1935)]
    pub ingest_rtmp_port: u16,

    /// Recording controller host, for STOP_RECORDING jobs
    #[arg(long, env = "MOTHERSTREAM_RECORDING_HOST")]
    pub recording_host: Option<String>,

    /// Recording controller port
    #[arg(long, env = "MOTHERSTREAM_RECORDING_PORT")]
    pub recording_port: Option<u16>,

    /// Chat/notification webhook URL
    #[arg(long, env = "MOTHERSTREAM_NOTIFICATION_WEBHOOK_URL")]
    pub notification_webhook_url: Option<String>,

    /// When true, on_publish/on_forward responses include a second URL
    /// naming the recording ingest in addition to the motherstream URL
    #[arg(long, env = "MOTHERSTREAM_ALSO_RECORD", default_value_t = false)]
    pub also_record: bool,

    /// Optional debug/metrics port; unset disables it
    #[arg(long, env = "MOTHERSTREAM_DEBUG_PORT")]
    pub debug_port: Option<u16>,

    /// Default swap interval in seconds, see design note (c)
    #[arg(long, env = "MOTHERSTREAM_SWAP_INTERVAL_SECS", default_value_t = default_swap_interval_secs())]
    pub swap_interval_secs: u64,

    /// Minimum spacing enforced between compositor-class jobs
    #[arg(long, env = "MOTHERSTREAM_OBS_JOB_DELAY_MS", default_value_t = default_obs_job_delay_ms())]
    pub obs_job_delay_ms: u64,

    /// Health sampler poll period in seconds, clamped to [0.1, 10.0]
    #[arg(long, env = "MOTHERSTREAM_HEALTH_POLL_INTERVAL_SECS", default_value_t = default_health_poll_interval_secs())]
    pub health_poll_interval_secs: f64,

    /// Path to the persisted queue snapshot (`QUEUE.json`)
    #[arg(long, env = "MOTHERSTREAM_QUEUE_SNAPSHOT_PATH", default_value = "QUEUE.json")]
    pub queue_snapshot_path: PathBuf,

    /// Directory the hourly health CSVs and their rollover reports are
    /// written into
    #[arg(long, env = "MOTHERSTREAM_HEALTH_CSV_DIR", default_value = ".")]
    pub health_csv_dir: PathBuf,

    /// Path to the job-timing CSV
    #[arg(long, env = "MOTHERSTREAM_JOB_TIMING_CSV_PATH", default_value = "job-timing.csv")]
    pub job_timing_csv_path: PathBuf,
}

impl Args {
    /// Parse from `std::env` + process args, validating cross-field
    /// constraints that `clap` itself can't express.
    pub fn load() -> Result<Self> {
        let args = Args::parse();
        args.validate()?;
        Ok(args)
    }

    fn validate(&self) -> Result<()> {
        if self.health_poll_interval_secs < 0.1 || self.health_poll_interval_secs > 10.0 {
            return Err(OrchestratorError::Config(format!(
                "health_poll_interval_secs must be in [0.1, 10.0], got {}",
                self.health_poll_interval_secs
            )));
        }
        if self.compositor_host.is_empty() {
            return Err(OrchestratorError::Config("compositor_host must not be empty".into()));
        }
        if self.ingest_host.is_empty() {
            return Err(OrchestratorError::Config("ingest_host must not be empty".into()));
        }
        Ok(())
    }

    pub fn compositor_ws_url(&self) -> String {
        format!("ws://{}:{}", self.compositor_host, self.compositor_port)
    }
}

//! Boundary traits for collaborators the orchestrator does not own:
//! user/credential storage, chat notifications, the recording controller,
//! and song identification. Each is specified only at its interface, per
//! the out-of-scope list — HTTP transport, login, password reset, email
//! delivery and so on live outside this crate entirely.

pub mod http_impls;
pub mod mock;

use async_trait::async_trait;
use motherstream_common::UserRecord;

/// Resolves stream-keys and persisted user ids to full user records.
/// Backed by whatever account system owns login/profile/credentials.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn resolve_by_stream_key(&self, stream_key: &str) -> Option<UserRecord>;
    async fn resolve_by_id(&self, id: i64) -> Option<UserRecord>;
}

/// A one-way notification sink (chat webhook, etc). Best-effort: the
/// orchestrator does not guarantee exactly-once delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> anyhow::Result<()>;
}

/// Starts/stops the recording of the currently-live source.
#[async_trait]
pub trait RecordingController: Send + Sync {
    async fn begin_recording(&self, source_name: &str) -> anyhow::Result<()>;
    async fn stop_recording(&self, source_name: &str) -> anyhow::Result<()>;
}

/// Identifies the song currently playing through a source, for display
/// purposes. Best-effort; a `None` simply means "unknown right now".
#[async_trait]
pub trait SongIdentifier: Send + Sync {
    async fn identify(&self, source_name: &str) -> Option<String>;
}

/// Tells the ingest RTMP server to drop a publisher's connection
/// (`kick-publisher`), so it either disconnects for good or reconnects
/// and re-triggers the forward decision.
#[async_trait]
pub trait IngestController: Send + Sync {
    async fn kick_publisher(&self, stream_key: &str) -> anyhow::Result<()>;
}

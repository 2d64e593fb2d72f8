//! In-memory stand-ins for the external collaborators, used by the test
//! suite and by `motherstream-orchestrator`'s own integration tests.

use super::{IngestController, NotificationSink, RecordingController, SongIdentifier, UserProvider};
use async_trait::async_trait;
use motherstream_common::UserRecord;
use std::collections::HashMap;
use std::sync::Mutex;

/// A fixed address book of users, keyed by stream-key and by id.
#[derive(Default)]
pub struct MockUserProvider {
    users: Vec<UserRecord>,
}

impl MockUserProvider {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserProvider for MockUserProvider {
    async fn resolve_by_stream_key(&self, stream_key: &str) -> Option<UserRecord> {
        self.users.iter().find(|u| u.stream_key == stream_key).cloned()
    }

    async fn resolve_by_id(&self, id: i64) -> Option<UserRecord> {
        self.users.iter().find(|u| u.id == id).cloned()
    }
}

/// Records every notification it receives, for assertions in tests.
#[derive(Default)]
pub struct MockNotificationSink {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSink for MockNotificationSink {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Tracks begin/stop calls per source name, for assertions in tests.
#[derive(Default)]
pub struct MockRecordingController {
    pub active: Mutex<HashMap<String, bool>>,
}

#[async_trait]
impl RecordingController for MockRecordingController {
    async fn begin_recording(&self, source_name: &str) -> anyhow::Result<()> {
        self.active.lock().unwrap().insert(source_name.to_string(), true);
        Ok(())
    }

    async fn stop_recording(&self, source_name: &str) -> anyhow::Result<()> {
        self.active.lock().unwrap().insert(source_name.to_string(), false);
        Ok(())
    }
}

/// Always returns `None`; song identification is best-effort and optional.
#[derive(Default)]
pub struct MockSongIdentifier;

#[async_trait]
impl SongIdentifier for MockSongIdentifier {
    async fn identify(&self, _source_name: &str) -> Option<String> {
        None
    }
}

/// Records kicked stream-keys, for assertions in tests.
#[derive(Default)]
pub struct MockIngestController {
    pub kicked: Mutex<Vec<String>>,
}

#[async_trait]
impl IngestController for MockIngestController {
    async fn kick_publisher(&self, stream_key: &str) -> anyhow::Result<()> {
        self.kicked.lock().unwrap().push(stream_key.to_string());
        Ok(())
    }
}

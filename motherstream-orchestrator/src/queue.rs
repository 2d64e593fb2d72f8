//! Queue (C1): thread-safe FIFO of user records with an on-disk
//! snapshot. Shares its lock with [`crate::stream_manager::StreamManager`]
//! via the same `Arc<Mutex<CoreState>>` — see `core_state.rs`.

use crate::core_state::CoreState;
use crate::error::Result;
use crate::external::UserProvider;
use crate::persistence;
use motherstream_common::UserRecord;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Queue {
    pub(crate) core: Arc<Mutex<CoreState>>,
    snapshot_path: PathBuf,
    user_provider: Arc<dyn UserProvider>,
}

impl Queue {
    pub fn new(core: Arc<Mutex<CoreState>>, snapshot_path: PathBuf, user_provider: Arc<dyn UserProvider>) -> Self {
        Self { core, snapshot_path, user_provider }
    }

    /// Reload the persisted id list at startup, translating ids back to
    /// full user records. Unresolvable ids are dropped with a log entry.
    pub async fn load_from_snapshot(&self) -> Result<()> {
        let ids = persistence::read_queue_snapshot(&self.snapshot_path).await?;
        let mut core = self.core.lock().await;
        for id in ids {
            match self.user_provider.resolve_by_id(id).await {
                Some(user) => {
                    core.add_if_absent(user);
                }
                None => warn!("queue snapshot referenced unknown user id {id}, dropping"),
            }
        }
        info!("loaded {} queue entries from snapshot", core.queue.len());
        Ok(())
    }

    async fn persist(&self, core: &CoreState) -> Result<()> {
        if let Err(e) = persistence::write_queue_snapshot(&self.snapshot_path, &core.snapshot_ids()).await {
            // Per design: persistence failures are logged, not rolled back.
            warn!("failed to persist queue snapshot: {e}");
        }
        Ok(())
    }

    pub async fn add_if_absent(&self, user: UserRecord) -> Result<bool> {
        let mut core = self.core.lock().await;
        let inserted = core.add_if_absent(user);
        if inserted {
            self.persist(&core).await?;
        }
        Ok(inserted)
    }

    pub async fn remove_by_key(&self, stream_key: &str) -> Result<()> {
        let mut core = self.core.lock().await;
        core.remove_by_key(stream_key);
        self.persist(&core).await
    }

    pub async fn dequeue_head(&self) -> Result<Option<UserRecord>> {
        let mut core = self.core.lock().await;
        let removed = core.dequeue_head();
        self.persist(&core).await?;
        Ok(removed)
    }

    pub async fn peek_head(&self) -> Option<UserRecord> {
        self.core.lock().await.peek_head().cloned()
    }

    pub async fn lead_key(&self) -> Option<String> {
        self.core.lock().await.lead_key()
    }

    pub async fn snapshot_keys(&self) -> Vec<String> {
        self.core.lock().await.snapshot_keys()
    }

    pub async fn snapshot_names(&self) -> Vec<String> {
        self.core.lock().await.snapshot_names()
    }

    pub async fn get_lead_info(&self) -> (Option<String>, Option<UserRecord>, usize) {
        self.core.lock().await.get_lead_info()
    }
}

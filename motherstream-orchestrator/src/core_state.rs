//! The state guarded by the single shared lock (L-QUEUE): the Queue's
//! sequence plus the Stream Manager's scalar fields. Bundling them into
//! one struct behind one `tokio::sync::Mutex` is how this crate realizes
//! the "reentrant lock shared by Queue and Stream Manager" the design
//! calls for — see `SPEC_FULL.md` §5. Every method here takes an
//! already-held `&mut self`; nothing in this module acquires a lock.

use crate::time_manager::TimeManager;
use motherstream_common::UserRecord;
use std::collections::VecDeque;

#[derive(Default)]
pub struct CoreState {
    pub queue: VecDeque<UserRecord>,
    pub last_kicked_key: Option<String>,
    pub blocking_last: bool,
    pub priority_key: Option<String>,
    pub time_manager: Option<TimeManager>,
    pub obs_turned_off_for_empty_queue: bool,
}

impl CoreState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Queue operations (Q-UNIQ, Q-PERSIST maintained by the caller) ----

    pub fn add_if_absent(&mut self, user: UserRecord) -> bool {
        if self.queue.iter().any(|u| u.stream_key == user.stream_key) {
            return false;
        }
        self.queue.push_back(user);
        true
    }

    pub fn remove_by_key(&mut self, stream_key: &str) {
        if let Some(pos) = self.queue.iter().position(|u| u.stream_key == stream_key) {
            self.queue.remove(pos);
        }
    }

    pub fn dequeue_head(&mut self) -> Option<UserRecord> {
        self.queue.pop_front()
    }

    pub fn peek_head(&self) -> Option<&UserRecord> {
        self.queue.front()
    }

    pub fn lead_key(&self) -> Option<String> {
        self.queue.front().map(|u| u.stream_key.clone())
    }

    pub fn snapshot_keys(&self) -> Vec<String> {
        self.queue.iter().map(|u| u.stream_key.clone()).collect()
    }

    pub fn snapshot_names(&self) -> Vec<String> {
        self.queue.iter().map(|u| u.display_name.clone()).collect()
    }

    pub fn snapshot_ids(&self) -> Vec<i64> {
        self.queue.iter().map(|u| u.id).collect()
    }

    /// Atomic triple to avoid torn reads across (key, user, len).
    pub fn get_lead_info(&self) -> (Option<String>, Option<UserRecord>, usize) {
        (self.lead_key(), self.peek_head().cloned(), self.queue.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, key: &str) -> UserRecord {
        UserRecord { id, stream_key: key.to_string(), display_name: key.to_string(), timezone: "UTC".to_string() }
    }

    #[test]
    fn add_if_absent_rejects_duplicate_keys() {
        let mut s = CoreState::new();
        assert!(s.add_if_absent(user(1, "a")));
        assert!(!s.add_if_absent(user(2, "a")));
        assert_eq!(s.queue.len(), 1);
    }

    #[test]
    fn remove_by_key_is_idempotent() {
        let mut s = CoreState::new();
        s.add_if_absent(user(1, "a"));
        s.remove_by_key("a");
        s.remove_by_key("a");
        assert!(s.queue.is_empty());
    }

    #[test]
    fn dequeue_head_pops_fifo_order() {
        let mut s = CoreState::new();
        s.add_if_absent(user(1, "a"));
        s.add_if_absent(user(2, "b"));
        assert_eq!(s.dequeue_head().unwrap().stream_key, "a");
        assert_eq!(s.lead_key(), Some("b".to_string()));
    }
}

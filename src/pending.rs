//! Pending verification entries and the store that owns them.
//!
//! Existence of an entry is the "pending" state. Every lookup-then-mutate
//! sequence runs under the store's lock so a photo and an expiring deadline
//! can never both claim the same entry.

use crate::deadline::Deadline;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use teloxide::types::{ChatId, UserId};
use tokio::sync::Mutex;

/// Identifies one user's verification within one chat.
pub type PendingKey = (ChatId, UserId);

/// One user awaiting verification.
#[derive(Debug)]
pub struct PendingEntry {
    pub id: u64,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub verified: bool,
    pub deadline: Deadline,
    pub created_at: Instant,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: HashMap<PendingKey, PendingEntry>,
}

/// Shared handle to the pending entries. Clones refer to the same map.
#[derive(Clone, Default)]
pub struct PendingStore {
    inner: Arc<Mutex<Inner>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entry for `key` unless one is already pending.
    ///
    /// `schedule` receives the new entry id and returns its deadline; it runs
    /// under the lock so the deadline can never observe the key before the
    /// entry exists. Returns the new id, or `None` if the key was taken.
    pub async fn insert_with<F>(&self, key: PendingKey, schedule: F) -> Option<u64>
    where
        F: FnOnce(u64) -> Deadline,
    {
        let mut inner = self.inner.lock().await;
        if inner.entries.contains_key(&key) {
            return None;
        }
        inner.next_id += 1;
        let id = inner.next_id;
        let entry = PendingEntry {
            id,
            chat_id: key.0,
            user_id: key.1,
            verified: false,
            deadline: schedule(id),
            created_at: Instant::now(),
        };
        inner.entries.insert(key, entry);
        Some(id)
    }

    /// Flag the entry verified and take it out of the store in one step.
    /// `None` means nothing was pending, so the caller has nothing to do.
    pub async fn claim_verified(&self, key: PendingKey) -> Option<PendingEntry> {
        let mut inner = self.inner.lock().await;
        match inner.entries.get_mut(&key) {
            Some(entry) if !entry.verified => entry.verified = true,
            _ => return None,
        }
        inner.entries.remove(&key)
    }

    /// Take the entry out for removal, but only if it is still the entry the
    /// expiring deadline was scheduled for and it has not been verified.
    pub async fn claim_expired(&self, key: PendingKey, id: u64) -> Option<PendingEntry> {
        let mut inner = self.inner.lock().await;
        let claimable = matches!(
            inner.entries.get(&key),
            Some(entry) if entry.id == id && !entry.verified
        );
        if claimable {
            inner.entries.remove(&key)
        } else {
            None
        }
    }

    #[cfg(test)]
    pub async fn contains(&self, key: PendingKey) -> bool {
        self.inner.lock().await.entries.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

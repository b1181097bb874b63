use std::collections::{HashMap, VecDeque};

use tokio::sync::Mutex;

use crate::domain::{MessageId, UserId};

/// Maps admin-channel message ids back to the end user an inquiry came
/// from. Both the Header and the Copy of one inquiry map to the same user,
/// so the admin can reply to either.
///
/// The table is memory-only and bounded: oldest entries are evicted once
/// `capacity` is exceeded. The `UID:` tag embedded in every Header keeps
/// evicted (and restart-lost) messages resolvable through the textual
/// fallback rules.
pub struct CorrelationStore {
    inner: Mutex<Inner>,
}

struct Inner {
    capacity: usize,
    entries: HashMap<MessageId, UserId>,
    // Insertion order, for oldest-first eviction.
    order: VecDeque<MessageId>,
}

impl CorrelationStore {
    /// `capacity` must cover at least one full forward (two rows).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity: capacity.max(2),
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub async fn put(&self, id: MessageId, user: UserId) {
        let mut inner = self.inner.lock().await;
        if inner.entries.insert(id, user).is_none() {
            inner.order.push_back(id);
        }
        while inner.order.len() > inner.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub async fn get(&self, id: MessageId) -> Option<UserId> {
        self.inner.lock().await.entries.get(&id).copied()
    }

    pub async fn delete(&self, id: MessageId) -> Option<UserId> {
        let mut inner = self.inner.lock().await;
        let removed = inner.entries.remove(&id);
        if removed.is_some() {
            inner.order.retain(|m| *m != id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

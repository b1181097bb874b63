use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::UserId;

/// Sticky per-admin routing target for free-form messages without a
/// reply-to. At most one target per admin; the target is consumed by one
/// relay attempt so a stale activation cannot swallow later messages.
#[derive(Default)]
pub struct ActiveTargetStore {
    inner: Mutex<HashMap<UserId, UserId>>,
}

impl ActiveTargetStore {
    /// Make `user` the admin's target. Last write wins.
    pub async fn activate(&self, admin: UserId, user: UserId) {
        self.inner.lock().await.insert(admin, user);
    }

    /// Remove the admin's target unconditionally. No-op when absent.
    pub async fn cancel(&self, admin: UserId) {
        self.inner.lock().await.remove(&admin);
    }

    /// Take the admin's target, removing it: one relay attempt per
    /// activation, however the attempt ends.
    pub async fn consume(&self, admin: UserId) -> Option<UserId> {
        self.inner.lock().await.remove(&admin)
    }

    pub async fn get(&self, admin: UserId) -> Option<UserId> {
        self.inner.lock().await.get(&admin).copied()
    }
}

//! In-process lock table with expiring entries.
//!
//! A held lock stays valid for `ttl` at most; after that any acquirer may take
//! it over. Release is tied to the owner token, so a holder whose lock expired
//! and was taken over cannot release the new owner's lock.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use super::traits::{LockGuard, LockService};
use crate::config::LockConfig;

#[derive(Debug)]
struct LockEntry {
    token: Uuid,
    expires_at: Instant,
}

pub struct MutexService {
    locks: Arc<DashMap<String, LockEntry>>,
    wait_timeout: Duration,
    retry_interval: Duration,
    ttl: Duration,
}

impl MutexService {
    pub fn new(config: &LockConfig) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            wait_timeout: config.wait_timeout(),
            retry_interval: config.retry_interval(),
            ttl: config.ttl(),
        }
    }

    /// Number of keys currently present in the lock table
    #[cfg(test)]
    pub fn held(&self) -> usize {
        self.locks.len()
    }

    fn try_lock(&self, key: &str) -> Option<Uuid> {
        let now = Instant::now();
        let token = Uuid::new_v4();
        let entry = LockEntry {
            token,
            expires_at: now + self.ttl,
        };

        match self.locks.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Some(token)
            }
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at > now {
                    return None;
                }
                tracing::warn!("Lock {} expired before release, taking it over", key);
                occupied.insert(entry);
                Some(token)
            }
        }
    }
}

#[async_trait]
impl LockService for MutexService {
    async fn acquire(&self, key: &str) -> Option<LockGuard> {
        let deadline = Instant::now() + self.wait_timeout;

        loop {
            if let Some(token) = self.try_lock(key) {
                tracing::debug!("Lock acquired: {}", key);
                let locks = Arc::clone(&self.locks);
                let owned_key = key.to_string();
                return Some(LockGuard::new(key, move || {
                    locks.remove_if(&owned_key, |_, entry| entry.token == token);
                }));
            }

            if Instant::now() >= deadline {
                tracing::debug!("Gave up waiting for lock: {}", key);
                return None;
            }
            tokio::time::sleep(self.retry_interval).await;
        }
    }
}

//! Time-bounded in-memory cache
//!
//! Holds one value for a fixed time-to-live. Used for the site settings,
//! which every rendered view needs but which change rarely.

use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

pub struct TtlCache<T> {
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// The cached value if it has not expired
    pub async fn get(&self) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    pub async fn set(&self, value: T) {
        let mut entry = self.entry.write().await;
        *entry = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    /// Drop the cached value so the next read loads a fresh one
    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        *entry = None;
    }
}

//! Deferred task scheduling collaborator
//!
//! The product's real scheduler lives outside this core (a queue with
//! delayed delivery). The trait contract is idempotency per key; the
//! in-memory implementation backs tests and embedders without a queue.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Deferred task collaborator. `schedule` is idempotent per `key`.
#[async_trait]
pub trait DeferredTaskScheduler: Send + Sync {
    /// Returns `Ok(false)` when the key was already scheduled and the call
    /// was suppressed as a duplicate.
    async fn schedule(&self, key: &str, fire_at: DateTime<Utc>, payload: Value) -> Result<bool>;
}

/// A task held by the in-memory scheduler.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub fire_at: DateTime<Utc>,
    pub payload: Value,
}

/// In-memory scheduler with keyed dedup; nothing ever fires.
#[derive(Default)]
pub struct InMemoryScheduler {
    tasks: Mutex<BTreeMap<String, ScheduledTask>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled_keys(&self) -> Vec<String> {
        self.tasks.lock().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<ScheduledTask> {
        self.tasks.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}

#[async_trait]
impl DeferredTaskScheduler for InMemoryScheduler {
    async fn schedule(&self, key: &str, fire_at: DateTime<Utc>, payload: Value) -> Result<bool> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(key) {
            return Ok(false);
        }
        tasks.insert(key.to_string(), ScheduledTask { fire_at, payload });
        Ok(true)
    }
}

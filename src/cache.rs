//! Short-lived report result cache.
//!
//! Entries expire after the staleness window. A computation takes a
//! [`Ticket`] before fetching; when it completes, its result is stored only if
//! no newer ticket for the same key has already completed and no invalidation
//! happened after the ticket was taken. This keeps a slow, superseded fetch
//! from overwriting a newer one.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::FilterSpec;

struct CacheEntry {
    value: serde_json::Value,
    generation: u64,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    key: String,
    generation: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Last generation handed out, across all keys.
    issued: u64,
    /// Tickets at or below this generation predate the last invalidation.
    invalidated_at: u64,
}

pub struct ReportCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        ReportCache {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn key(report: &str, filter: &FilterSpec) -> String {
        let filter = serde_json::to_string(filter).unwrap_or_default();
        format!("{}:{}", report, filter)
    }

    /// Fresh cached value for `key`, if any.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.state.lock().ok()?;
        let entry = state.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn begin(&self, key: &str) -> Ticket {
        let generation = match self.state.lock() {
            Ok(mut state) => {
                state.issued += 1;
                state.issued
            }
            Err(_) => 0,
        };
        Ticket {
            key: key.to_string(),
            generation,
        }
    }

    /// Stores `value` under the ticket's key. Returns `false` when the value
    /// was discarded: a newer ticket already completed, or the cache was
    /// invalidated after this ticket was taken. Expired entries are dropped.
    pub fn complete<T: Serialize>(&self, ticket: Ticket, value: &T) -> bool {
        let Ok(value) = serde_json::to_value(value) else {
            return false;
        };
        let Ok(mut state) = self.state.lock() else {
            return false;
        };

        let now = Instant::now();
        state.entries.retain(|_, entry| entry.expires_at > now);

        if ticket.generation <= state.invalidated_at {
            tracing::debug!(key = %ticket.key, "Discarding report result fetched before invalidation");
            return false;
        }
        if let Some(existing) = state.entries.get(&ticket.key) {
            if existing.generation > ticket.generation {
                tracing::debug!(key = %ticket.key, "Discarding superseded report result");
                return false;
            }
        }

        state.entries.insert(
            ticket.key,
            CacheEntry {
                value,
                generation: ticket.generation,
                expires_at: now + self.ttl,
            },
        );
        true
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
            state.invalidated_at = state.issued;
        }
    }

    /// Returns the cached value or computes, stores and returns a fresh one.
    pub fn get_or_compute<T, F>(&self, key: &str, compute: F) -> crate::error::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> crate::error::Result<T>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }
        let ticket = self.begin(key);
        let value = compute()?;
        self.complete(ticket, &value);
        Ok(value)
    }
}

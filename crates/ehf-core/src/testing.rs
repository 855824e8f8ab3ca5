//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::EntityId;
use crate::ports::{SourceError, StatusSource};

pub fn id(s: &str) -> EntityId {
    EntityId::new(s).unwrap()
}

pub fn ids(values: &[&str]) -> Vec<EntityId> {
    values.iter().map(|s| id(s)).collect()
}

/// Scripted source: answers per id, tracks calls and concurrency.
#[derive(Default)]
pub struct ScriptedSource {
    flags: HashMap<EntityId, bool>,
    failing: Vec<EntityId>,
    bulk: Option<HashMap<EntityId, bool>>,
    bulk_fails: bool,
    delay: Duration,
    calls: AtomicUsize,
    bulk_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    bulk_queries: Mutex<Vec<Vec<EntityId>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag(mut self, key: &str, flag: bool) -> Self {
        self.flags.insert(id(key), flag);
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.push(id(key));
        self
    }

    pub fn with_bulk(mut self, entries: &[(&str, bool)]) -> Self {
        self.bulk = Some(entries.iter().map(|(k, v)| (id(k), *v)).collect());
        self
    }

    pub fn bulk_failing(mut self) -> Self {
        self.bulk_fails = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn bulk_queries(&self) -> Vec<Vec<EntityId>> {
        self.bulk_queries.lock().unwrap().clone()
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch_status(&self, id: &EntityId) -> Result<bool, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        self.leave();

        if self.failing.contains(id) {
            return Err(SourceError::Transport {
                url: format!("scripted://{id}"),
                message: "connection reset".to_string(),
            });
        }
        self.flags.get(id).copied().ok_or_else(|| SourceError::Status {
            url: format!("scripted://{id}"),
            status: 404,
        })
    }

    async fn fetch_bulk(&self, ids: &[EntityId]) -> Result<HashMap<EntityId, bool>, SourceError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        self.bulk_queries.lock().unwrap().push(ids.to_vec());
        self.enter().await;
        self.leave();

        if self.bulk_fails {
            return Err(SourceError::Status {
                url: "scripted://bulk".to_string(),
                status: 500,
            });
        }
        Ok(self.bulk.clone().unwrap_or_default())
    }
}

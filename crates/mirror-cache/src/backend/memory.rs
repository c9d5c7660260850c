//! In-process [`CacheBackend`] for tests and failure injection.
//!
//! Batches apply all-or-nothing under one lock, mirroring the MULTI/EXEC
//! guarantee of the real backend. [`MemoryBackend::fail_next_apply`]
//! aborts the next batch before any mutation, which is how the
//! atomicity properties are exercised without a server.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mirror_domain::FlatEntry;

use super::{BatchOp, CacheBackend, WriteBatch};
use crate::error::{MirrorError, Result};

#[derive(Default)]
struct Store {
    hashes: HashMap<String, FlatEntry>,
    sets: HashMap<String, BTreeSet<String>>,
    strings: HashMap<String, String>,
}

/// Hash/set/string store held in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    fail_next_apply: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`apply`](CacheBackend::apply) fail without
    /// mutating anything.
    pub fn fail_next_apply(&self) {
        self.fail_next_apply.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        // a poisoned lock means a panicking test, not recoverable state
        self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn hash(&self, key: &str) -> Result<FlatEntry> {
        Ok(self.lock().hashes.get(key).cloned().unwrap_or_default())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().strings.get(key).cloned())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_next_apply.swap(false, Ordering::SeqCst) {
            return Err(MirrorError::Cache("injected batch failure".to_string()));
        }

        let mut store = self.lock();
        for op in batch.ops() {
            match op {
                BatchOp::Del(key) => {
                    store.hashes.remove(key);
                    store.sets.remove(key);
                    store.strings.remove(key);
                }
                BatchOp::HSet(key, fields) => {
                    let hash = store.hashes.entry(key.clone()).or_default();
                    for (field, value) in fields {
                        hash.insert(field.clone(), value.clone());
                    }
                }
                BatchOp::Set(key, value) => {
                    store.strings.insert(key.clone(), value.clone());
                }
                BatchOp::SAdd(key, member) => {
                    store
                        .sets
                        .entry(key.clone())
                        .or_default()
                        .insert(member.clone());
                }
                BatchOp::SRem(key, member) => {
                    if let Some(members) = store.sets.get_mut(key) {
                        members.remove(member);
                    }
                }
            }
        }
        Ok(())
    }
}

//! # Cache Backend
//!
//! Narrow interface over the key-value store: the three read shapes the
//! reader needs (hash, set, string) plus [`WriteBatch`], an explicit
//! all-or-nothing command group. Concurrent readers observe the state
//! before or after a whole batch, never a partially applied one.

pub mod memory;
pub mod redis_impl;

pub use memory::MemoryBackend;
pub use redis_impl::RedisBackend;

use async_trait::async_trait;
use mirror_domain::FlatEntry;

use crate::error::Result;

/// One command inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Delete a key of any kind (idempotent when absent).
    Del(String),
    /// Bulk-set hash fields.
    HSet(String, Vec<(String, String)>),
    /// Set a plain string key.
    Set(String, String),
    /// Add a member to a set.
    SAdd(String, String),
    /// Remove a member from a set.
    SRem(String, String),
}

/// Ordered group of commands committed together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn del(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Del(key.into()));
        self
    }

    pub fn hset(&mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> &mut Self {
        self.ops.push(BatchOp::HSet(key.into(), fields));
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Set(key.into(), value.into()));
        self
    }

    pub fn sadd(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SAdd(key.into(), member.into()));
        self
    }

    pub fn srem(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SRem(key.into(), member.into()));
        self
    }

    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Key-value store operations the mirror relies on.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// All fields of a hash key; empty map when the key is absent.
    async fn hash(&self, key: &str) -> Result<FlatEntry>;

    /// Members of a set key; empty when absent.
    async fn set_members(&self, key: &str) -> Result<Vec<String>>;

    /// Plain string key.
    async fn string(&self, key: &str) -> Result<Option<String>>;

    /// Apply a batch atomically. On error nothing from the batch is
    /// visible.
    async fn apply(&self, batch: WriteBatch) -> Result<()>;
}

//! # Record Mirror - Cache Layer
//!
//! Mirrors primary-store records into a Redis-style key-value cache so
//! reads can be served without touching the authoritative store. A
//! record and its one-level nested associations flatten into a single
//! hash entry under `"<type>:<id>"`, alongside a per-type index set of
//! known ids.
//!
//! ```text
//! primary store record
//!         │
//!         ▼
//! ┌───────────────────┐     ┌────────────────────┐
//! │ Flattening Codec  │────▶│ Dual-Write         │──▶ atomic batch
//! │ (encode)          │     │ Coordinator        │    DEL + HSET + SADD
//! └───────────────────┘     └────────────────────┘
//!
//! ┌───────────────────┐     ┌────────────────────┐
//! │ Reader            │◀────│ Cache Backend      │◀── HGETALL / SMEMBERS
//! │ (decode + attach) │     │ (Redis or memory)  │
//! └───────────────────┘     └────────────────────┘
//! ```
//!
//! The mirror is best-effort: connectivity loss degrades the connection
//! manager's handle instead of crashing the caller, and on the lenient
//! write paths cache failures never fail the primary operation.

pub mod backend;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod reader;
pub mod record;
pub mod resync;
pub mod store;
pub mod writer;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use backend::{BatchOp, CacheBackend, MemoryBackend, RedisBackend, WriteBatch};
pub use config::CacheConfig;
pub use connection::{ConnectionManager, ProbeOutcome, RetryPolicy};
pub use error::{MirrorError, Result};
pub use reader::Reader;
pub use record::MirroredRecord;
pub use resync::ResyncDriver;
pub use store::PrimaryStore;
pub use writer::DualWriter;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Connection Manager
//!
//! Owns a single lazily created multiplexed handle to the cache backend
//! and keeps it usable across transient outages. Before a cached handle
//! is returned it is probed with a cheap PING; repeated probe failures
//! discard and rebuild the handle up to a fixed ceiling, after which the
//! last-known handle is returned as-is and individual command failures
//! surface to the caller.
//!
//! The manager is an explicit object owned by the composition root, not
//! process-wide state. It never blocks indefinitely: every pass through
//! the probe loop moves the failure counter toward the ceiling.

use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;

use crate::config::CacheConfig;
use crate::error::Result;

/// Consecutive probe failures tolerated before the manager stops
/// rebuilding the handle.
pub const PROBE_CEILING: u32 = 5;

/// Decision after recording a probe failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Discard the handle and build a fresh one.
    Rebuild,
    /// Ceiling reached; hand out whatever handle exists.
    GiveUp,
}

/// Bounded-retry-with-reset policy for liveness probes.
///
/// The counter tracks consecutive failures only: any successful probe
/// resets it to zero.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    failures: u32,
    ceiling: u32,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(ceiling: u32) -> Self {
        Self { failures: 0, ceiling }
    }

    pub const fn record_success(&mut self) {
        self.failures = 0;
    }

    pub const fn record_failure(&mut self) -> ProbeOutcome {
        self.failures += 1;
        if self.failures < self.ceiling {
            ProbeOutcome::Rebuild
        } else {
            ProbeOutcome::GiveUp
        }
    }

    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(PROBE_CEILING)
    }
}

struct ManagerState {
    conn: Option<MultiplexedConnection>,
    policy: RetryPolicy,
}

/// Lazily connecting, self-healing handle owner for the cache backend.
pub struct ConnectionManager {
    client: redis::Client,
    state: Mutex<ManagerState>,
}

impl ConnectionManager {
    /// Build a manager for the configured host/port/credential. No
    /// connection is made until the first [`handle`](Self::handle) call.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url())?;
        Ok(Self {
            client,
            state: Mutex::new(ManagerState {
                conn: None,
                policy: RetryPolicy::default(),
            }),
        })
    }

    /// Get a live handle, probing and rebuilding as needed.
    ///
    /// Past the failure ceiling this returns the last-known handle even
    /// if the probe failed; callers must treat every command as
    /// fallible regardless. An error is returned only when no handle
    /// was ever established.
    pub async fn handle(&self) -> Result<MultiplexedConnection> {
        let mut state = self.state.lock().await;
        loop {
            let mut conn = match state.conn.clone() {
                Some(conn) => conn,
                None => match self.client.get_multiplexed_async_connection().await {
                    Ok(conn) => {
                        state.conn = Some(conn.clone());
                        conn
                    }
                    Err(err) => match state.policy.record_failure() {
                        ProbeOutcome::Rebuild => continue,
                        ProbeOutcome::GiveUp => return Err(err.into()),
                    },
                },
            };

            let probe: redis::RedisResult<String> =
                redis::cmd("PING").query_async(&mut conn).await;
            match probe {
                Ok(_) => {
                    state.policy.record_success();
                    return Ok(conn);
                }
                Err(err) => match state.policy.record_failure() {
                    ProbeOutcome::Rebuild => {
                        tracing::warn!(
                            error = %err,
                            failures = state.policy.failures(),
                            "cache probe failed, rebuilding handle"
                        );
                        state.conn = None;
                    }
                    ProbeOutcome::GiveUp => {
                        tracing::warn!(
                            error = %err,
                            failures = state.policy.failures(),
                            "cache probe ceiling reached, handing out last-known handle"
                        );
                        return Ok(conn);
                    }
                },
            }
        }
    }
}

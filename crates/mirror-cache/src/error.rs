//! Cache layer error types.

use thiserror::Error;

/// Errors surfaced by the cache mirror.
///
/// Cache mirroring is best-effort: the writer's lenient paths log and
/// swallow `Cache` errors instead of failing the primary operation.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("cache backend error: {0}")]
    Cache(String),

    #[error("record has no id yet: {type_name}")]
    MissingId { type_name: &'static str },

    #[error(transparent)]
    Domain(#[from] mirror_domain::DomainError),
}

impl From<redis::RedisError> for MirrorError {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;

//! Primary store collaborator interface.
//!
//! The authoritative store owns creation, validation, enumeration and
//! destruction of records; the cache layer only mirrors what the store
//! reports as persisted. Implementations live outside this crate.

use async_trait::async_trait;
use mirror_domain::{DomainError, RecordInput};

use crate::record::MirroredRecord;

/// Authoritative record store for one mirrored type.
#[async_trait]
pub trait PrimaryStore<R: MirroredRecord>: Send + Sync {
    /// Validate and persist a new record, or report the failing field.
    async fn create(&self, input: RecordInput) -> Result<R, DomainError>;

    /// Every persisted record of the type.
    async fn all(&self) -> Result<Vec<R>, DomainError>;

    /// Remove one record by id.
    async fn destroy(&self, id: &str) -> Result<(), DomainError>;
}

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::promotion::PromotionKind;

/// A single placement that must be deactivated at `due_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryJob {
    pub kind: PromotionKind,
    pub id: Uuid,
    pub due_at: DateTime<Utc>,
}

/// Fire-and-forget deferred deactivation.
///
/// Jobs are best effort: a lost job (process restart) is covered by the
/// read-time sweep and the periodic sweep loop, and running a job twice is
/// harmless because deactivation only touches rows that are still active.
pub trait ExpiryScheduler: Send + Sync {
    fn schedule(&self, job: ExpiryJob);
}

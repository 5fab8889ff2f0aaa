use serde::{Deserialize, Serialize};

/// Slot usage for one promotion kind under a subscription code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: i64,
    pub max: i64,
    pub remaining: i64,
}

impl QuotaUsage {
    pub fn new(used: i64, max: i64) -> Self {
        Self {
            used,
            max,
            remaining: (max - used).max(0),
        }
    }

    /// Returns true when no further placement can be created.
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.max
    }
}

use serde::{Deserialize, Serialize};

use crate::payload::ImagePayload;

pub type StoryId = u64;

/// Stories are kept for 24 hours after creation.
pub const RETENTION_MILLIS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub image: ImagePayload,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Story {
    pub fn is_expired(&self, now: u64) -> bool {
        is_expired(self.timestamp, now)
    }
}

/// A story exactly at the retention boundary is still live.
pub fn is_expired(timestamp: u64, now: u64) -> bool {
    now.saturating_sub(timestamp) > RETENTION_MILLIS
}

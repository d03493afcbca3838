use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

/// Synthetic values written into `id` and `timestamp` on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// 128 random bits as 32 lowercase hex characters.
    pub id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Issues identities for one facade.
///
/// Timestamps never go backwards, even when the wall clock does.
#[derive(Debug, Default)]
pub struct IdentityGenerator {
    last_timestamp: AtomicI64,
}

impl IdentityGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_identity(&self) -> Identity {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self.last_timestamp.fetch_max(now, Ordering::SeqCst);

        Identity {
            id: Uuid::new_v4().simple().to_string(),
            timestamp: now.max(previous),
        }
    }
}

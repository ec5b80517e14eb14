use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Keyed storage holding at most one refresh-token record per subject.
#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert or overwrite the subject's record. `expires_at` is stamped by
    /// the store as `now + ttl` at write time.
    async fn save(
        &self,
        subject_id: &SubjectId,
        token_hash: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Point lookup. A missing record is `Ok(None)`, not an error.
    async fn get(&self, subject_id: &SubjectId) -> Result<Option<RefreshTokenRecord>, StoreError>;
}

/// `now + ttl`, or a backend error when the sum leaves chrono's range.
pub fn expires_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, StoreError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| StoreError::Backend(format!("ttl out of range: {}s", ttl.as_secs())))
}

use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;

const HASH_FIELD: &str = "hash";
const EXPIRES_AT_FIELD: &str = "expires_at";

/// One redis hash per subject: `{prefix}:{subject_id}` with fields `hash` and
/// `expires_at` (unix millis). Keys carry no redis TTL, so a stale record is
/// still read back and reported as expired by the caller.
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    prefix: String,
    clock: Arc<dyn Clock>,
}

impl RedisRefreshTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        RedisRefreshTokenStore {
            conn,
            prefix: prefix.into(),
            clock,
        }
    }

    fn key(&self, subject_id: &SubjectId) -> String {
        format!("{}:{}", self.prefix, subject_id)
    }
}

fn record_from_fields(
    subject_id: &SubjectId,
    hash: Option<Vec<u8>>,
    expires_at_ms: Option<i64>,
) -> Result<Option<RefreshTokenRecord>, StoreError> {
    match (hash, expires_at_ms) {
        (None, None) => Ok(None),
        (Some(token_hash), Some(ms)) => {
            let expires_at = DateTime::<Utc>::from_timestamp_millis(ms)
                .ok_or_else(|| StoreError::Corrupt(format!("expires_at out of range: {}", ms)))?;
            Ok(Some(RefreshTokenRecord {
                subject_id: subject_id.clone(),
                token_hash,
                expires_at,
            }))
        }
        _ => Err(StoreError::Corrupt(format!(
            "partial refresh token record for {}",
            subject_id
        ))),
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn save(
        &self,
        subject_id: &SubjectId,
        token_hash: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = expires_after(self.clock.now(), ttl)?;
        let key = self.key(subject_id);
        let mut conn = self.conn.clone();

        // single HSET so both fields land together
        let _: () = redis::cmd("HSET")
            .arg(&key)
            .arg(HASH_FIELD)
            .arg(token_hash)
            .arg(EXPIRES_AT_FIELD)
            .arg(expires_at.timestamp_millis())
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let key = self.key(subject_id);
        let mut conn = self.conn.clone();
        let (hash, expires_at_ms): (Option<Vec<u8>>, Option<i64>) = redis::cmd("HMGET")
            .arg(&key)
            .arg(HASH_FIELD)
            .arg(EXPIRES_AT_FIELD)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        record_from_fields(subject_id, hash, expires_at_ms)
    }
}

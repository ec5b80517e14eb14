use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use std::sync::Arc;
use std::time::Duration;

pub struct MySqlRefreshTokenStore {
    pool: MySqlPool,
    clock: Arc<dyn Clock>,
}

impl MySqlRefreshTokenStore {
    pub fn new(pool: MySqlPool, clock: Arc<dyn Clock>) -> Self {
        MySqlRefreshTokenStore { pool, clock }
    }

    /// Create the `refresh_token` table if it is not there yet.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshTokenRecord, StoreError> {
        let subject_id: String = row
            .try_get("subject_id")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let token_hash: Vec<u8> = row
            .try_get("token_hash")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(RefreshTokenRecord {
            subject_id: SubjectId(subject_id),
            token_hash,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn save(
        &self,
        subject_id: &SubjectId,
        token_hash: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = expires_after(self.clock.now(), ttl)?;

        sqlx::query(
            r#"
INSERT INTO refresh_token (subject_id, token_hash, expires_at)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE token_hash = VALUES(token_hash), expires_at = VALUES(expires_at)
"#,
        )
        .bind(subject_id.as_str())
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("refresh token upsert: {e}")))?;

        Ok(())
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT subject_id, token_hash, expires_at
FROM refresh_token
WHERE subject_id = ?
"#,
        )
        .bind(subject_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("refresh token select: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

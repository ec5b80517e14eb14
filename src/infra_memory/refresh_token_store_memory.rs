use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Process-local store. Each `save` is a single map insert, so the upsert is
/// atomic per key.
pub struct MemoryRefreshTokenStore {
    records: DashMap<SubjectId, RefreshTokenRecord>,
    clock: Arc<dyn Clock>,
}

impl MemoryRefreshTokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryRefreshTokenStore {
            records: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn save(
        &self,
        subject_id: &SubjectId,
        token_hash: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let record = RefreshTokenRecord {
            subject_id: subject_id.clone(),
            token_hash: token_hash.to_vec(),
            expires_at: expires_after(self.clock.now(), ttl)?,
        };
        self.records.insert(subject_id.clone(), record);
        Ok(())
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(self.records.get(subject_id).map(|r| r.value().clone()))
    }
}

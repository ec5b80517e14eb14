use super::SubjectId;
use chrono::{DateTime, Utc};

/// The single persisted refresh-token record of a subject.
///
/// `token_hash` holds the slow salted hash of the refresh secret, never the
/// plaintext. The record is logically dead once `now >= expires_at`, whether
/// or not the store still holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub subject_id: SubjectId,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>) -> RefreshTokenRecord {
        RefreshTokenRecord {
            subject_id: SubjectId::from("user-1"),
            token_hash: b"$argon2id$stub".to_vec(),
            expires_at,
        }
    }

    #[test]
    fn record_expires_exactly_at_deadline() {
        let now = Utc::now();
        assert!(record(now).is_expired_at(now));
        assert!(record(now - Duration::seconds(1)).is_expired_at(now));
        assert!(!record(now + Duration::seconds(1)).is_expired_at(now));
    }
}

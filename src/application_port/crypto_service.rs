use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("random source failure: {0}")]
    Entropy(String),
    #[error("signing failure: {0}")]
    Signing(String),
    #[error("hashing failure: {0}")]
    Hashing(String),
    #[error("{0}")]
    InvalidToken(String),
}

/// Token and hash operations. Implementations hold configuration only, so
/// every call is independent.
///
/// Hashing is deliberately slow; async callers should run
/// [`CryptoService::generate_refresh_token`] and
/// [`CryptoService::compare_refresh_tokens`] off the reactor.
pub trait CryptoService: Send + Sync {
    fn generate_access_token(&self, subject_id: &SubjectId) -> Result<AccessToken, CryptoError>;

    /// Returns the subject of a token whose signature, algorithm family and
    /// expiry all check out.
    fn parse_access_token(&self, token: &AccessToken) -> Result<SubjectId, CryptoError>;

    /// Returns the plaintext refresh token together with the hash to persist.
    fn generate_refresh_token(&self) -> Result<(RefreshToken, Vec<u8>), CryptoError>;

    fn compare_refresh_tokens(
        &self,
        token_hash: &[u8],
        token: &RefreshToken,
    ) -> Result<(), CryptoError>;
}

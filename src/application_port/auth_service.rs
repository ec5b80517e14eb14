use crate::application_port::CryptoError;
use crate::domain_model::*;
use crate::domain_port::StoreError;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Failure of a login or refresh. The variant is the kind; the payload is a
/// human readable message with the context of every layer it went through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Crypto(String),
    #[error("{0}")]
    InvalidToken(String),
    #[error("{0}")]
    Storage(String),
    #[error("{0}")]
    Cancelled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Validation,
    Crypto,
    InvalidToken,
    Storage,
    Cancelled,
}

impl AuthError {
    pub fn cancelled() -> Self {
        AuthError::Cancelled("operation cancelled".to_string())
    }

    pub fn deadline_exceeded() -> Self {
        AuthError::Cancelled("deadline exceeded".to_string())
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::Validation(_) => AuthErrorKind::Validation,
            AuthError::Crypto(_) => AuthErrorKind::Crypto,
            AuthError::InvalidToken(_) => AuthErrorKind::InvalidToken,
            AuthError::Storage(_) => AuthErrorKind::Storage,
            AuthError::Cancelled(_) => AuthErrorKind::Cancelled,
        }
    }

    /// Prefix the message with `context`, keeping the kind.
    pub fn context(self, context: impl fmt::Display) -> Self {
        match self {
            AuthError::Validation(m) => AuthError::Validation(format!("{context}: {m}")),
            AuthError::Crypto(m) => AuthError::Crypto(format!("{context}: {m}")),
            AuthError::InvalidToken(m) => AuthError::InvalidToken(format!("{context}: {m}")),
            AuthError::Storage(m) => AuthError::Storage(format!("{context}: {m}")),
            // cancellation reads the same whichever step it interrupted
            cancelled @ AuthError::Cancelled(_) => cancelled,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Validation(m)
            | AuthError::Crypto(m)
            | AuthError::InvalidToken(m)
            | AuthError::Storage(m)
            | AuthError::Cancelled(m) => m,
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidToken(m) => AuthError::InvalidToken(m),
            e @ (CryptoError::Entropy(_) | CryptoError::Signing(_) | CryptoError::Hashing(_)) => {
                AuthError::Crypto(e.to_string())
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// Credential issuance and rotation.
///
/// Every call takes a cancellation token; once it fires the call returns
/// [`AuthError::Cancelled`] and nothing it may have written counts as committed.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Issue a fresh access/refresh pair, replacing any refresh record the
    /// subject already had.
    async fn login(
        &self,
        cancel: &CancellationToken,
        subject_id: &SubjectId,
    ) -> Result<TokenPair, AuthError>;

    /// Trade a valid access/refresh pair for a new one (rotation).
    async fn refresh(
        &self,
        cancel: &CancellationToken,
        access_token: &AccessToken,
        refresh_token: &RefreshToken,
    ) -> Result<TokenPair, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind_and_prefixes_message() {
        let err = AuthError::Storage("connection refused".into())
            .context("failed to save refresh token");
        assert_eq!(err.kind(), AuthErrorKind::Storage);
        assert_eq!(
            err.to_string(),
            "failed to save refresh token: connection refused"
        );
    }

    #[test]
    fn cancellation_ignores_context() {
        let err = AuthError::cancelled().context("failed to save refresh token");
        assert_eq!(err, AuthError::cancelled());
    }

    #[test]
    fn crypto_errors_split_into_fault_and_rejection() {
        let rejected: AuthError = CryptoError::InvalidToken("expired".into()).into();
        assert_eq!(rejected.kind(), AuthErrorKind::InvalidToken);
        assert_eq!(rejected.message(), "expired");

        let fault: AuthError = CryptoError::Entropy("no bytes".into()).into();
        assert_eq!(fault.kind(), AuthErrorKind::Crypto);
        assert_eq!(fault.message(), "random source failure: no bytes");
    }

    #[test]
    fn store_errors_are_storage_faults() {
        let err: AuthError = StoreError::Backend("timeout".into()).into();
        assert_eq!(err, AuthError::Storage("backend error: timeout".into()));
    }
}

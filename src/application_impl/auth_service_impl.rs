use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct RealAuthService {
    crypto: Arc<dyn CryptoService>,
    store: Arc<dyn RefreshTokenStore>,
    clock: Arc<dyn Clock>,
    refresh_token_ttl: Duration,
}

impl RealAuthService {
    pub fn new(
        crypto: Arc<dyn CryptoService>,
        store: Arc<dyn RefreshTokenStore>,
        clock: Arc<dyn Clock>,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            crypto,
            store,
            clock,
            refresh_token_ttl,
        }
    }

    /// Issue a pair and overwrite the subject's refresh record. Shared by
    /// login and by the rotation step of refresh.
    async fn issue(
        &self,
        cancel: &CancellationToken,
        subject_id: &SubjectId,
    ) -> Result<TokenPair, AuthError> {
        if cancel.is_cancelled() {
            return Err(AuthError::cancelled());
        }

        let access_token = self
            .crypto
            .generate_access_token(subject_id)
            .map_err(|e| AuthError::from(e).context("failed to generate access token"))?;

        let (refresh_token, token_hash) = self
            .run_crypto(cancel, |crypto| crypto.generate_refresh_token())
            .await
            .map_err(|e| e.context("failed to generate refresh token"))?;

        until_cancelled(cancel, async {
            self.store
                .save(subject_id, &token_hash, self.refresh_token_ttl)
                .await
                .map_err(AuthError::from)
        })
        .await
        .map_err(|e| e.context("failed to save refresh token"))?;

        debug!(%subject_id, "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Run a slow crypto call on the blocking pool, racing it against `cancel`.
    async fn run_crypto<T, F>(&self, cancel: &CancellationToken, f: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CryptoService) -> Result<T, CryptoError> + Send + 'static,
    {
        let crypto = self.crypto.clone();
        let task = tokio::task::spawn_blocking(move || f(crypto.as_ref()));
        until_cancelled(cancel, async {
            task.await
                .map_err(|e| AuthError::Crypto(format!("crypto task failed: {}", e)))?
                .map_err(AuthError::from)
        })
        .await
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AuthError::cancelled()),
        result = fut => result,
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    #[tracing::instrument(skip_all, fields(subject_id = %subject_id))]
    async fn login(
        &self,
        cancel: &CancellationToken,
        subject_id: &SubjectId,
    ) -> Result<TokenPair, AuthError> {
        if subject_id.is_empty() {
            return Err(AuthError::Validation("invalid guid".to_string()));
        }
        self.issue(cancel, subject_id).await
    }

    #[tracing::instrument(skip_all, fields(subject_id = tracing::field::Empty))]
    async fn refresh(
        &self,
        cancel: &CancellationToken,
        access_token: &AccessToken,
        refresh_token: &RefreshToken,
    ) -> Result<TokenPair, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::Validation("invalid access token".to_string()));
        }
        if refresh_token.is_empty() {
            return Err(AuthError::Validation("invalid refresh token".to_string()));
        }
        if cancel.is_cancelled() {
            return Err(AuthError::cancelled());
        }

        let subject_id = self
            .crypto
            .parse_access_token(access_token)
            .map_err(|e| AuthError::from(e).context("failed to parse access token"))?;
        tracing::Span::current().record("subject_id", tracing::field::display(&subject_id));

        let record = until_cancelled(cancel, async {
            self.store.get(&subject_id).await.map_err(AuthError::from)
        })
        .await
        .map_err(|e| e.context("failed to get refresh token"))?
        .ok_or_else(|| AuthError::InvalidToken("refresh token doesn't exist".to_string()))?;

        if record.is_expired_at(self.clock.now()) {
            return Err(AuthError::InvalidToken(
                "refresh token is expired".to_string(),
            ));
        }

        let token_hash = record.token_hash;
        let candidate = refresh_token.clone();
        self.run_crypto(cancel, move |crypto| {
            crypto.compare_refresh_tokens(&token_hash, &candidate)
        })
        .await
        .map_err(|e| match e.kind() {
            AuthErrorKind::InvalidToken => e.context("invalid token"),
            _ => e.context("failed to verify refresh token"),
        })?;

        // rotation: a brand new pair replaces the record just consumed
        self.issue(cancel, &subject_id).await
    }
}

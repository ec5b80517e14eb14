use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::infra_system::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Per-request cancellation: a child of the server's shutdown token plus a
/// deadline.
#[derive(Debug, Clone)]
pub struct RequestScope {
    cancel: CancellationToken,
    timeout: Duration,
}

impl RequestScope {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Await `fut`, giving up with [`AuthError::Cancelled`] after the deadline.
    pub async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, AuthError>>,
    ) -> Result<T, AuthError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| Err(AuthError::deadline_exceeded()))
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub request_scope: Arc<RequestScope>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let entropy: Arc<dyn EntropySource> = Arc::new(OsEntropy);

        let mut pool = None;
        let store: Arc<dyn RefreshTokenStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryRefreshTokenStore::new(clock.clone())),
            "redis" => {
                let redis_client = redis::Client::open(settings.store.redis_dsn.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisRefreshTokenStore::new(
                    redis_manager,
                    settings.store.redis_prefix.clone(),
                    clock.clone(),
                ))
            }
            "mysql" => {
                let mysql_pool = Pool::<MySql>::connect(&settings.store.mysql_dsn).await?;
                let store = MySqlRefreshTokenStore::new(mysql_pool.clone(), clock.clone());
                store.migrate().await?;
                pool = Some(mysql_pool);
                Arc::new(store)
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };
        info!(backend = %settings.store.backend, "refresh token store ready");

        let crypto: Arc<dyn CryptoService> = Arc::new(JwtArgon2CryptoService::try_new(
            CryptoConfig {
                access_token_ttl: settings.auth.access_token_ttl(),
                signing_key: settings.auth.secret_key.clone().into_bytes(),
                refresh_token_length: settings.auth.refresh_token_length,
                hash_cost: settings.auth.hash_cost_factor,
            },
            clock.clone(),
            entropy,
        )?);

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            crypto,
            store,
            clock,
            settings.auth.refresh_token_ttl(),
        ));

        let mut server = Self::new(auth_service, settings.http.request_timeout());
        server.pool = pool;

        info!("server started");
        Ok(server)
    }

    /// Wire a server around an already built auth service.
    pub fn new(auth_service: Arc<dyn AuthService>, request_timeout: Duration) -> Self {
        let cancel = CancellationToken::new();
        Self {
            auth_service,
            request_scope: Arc::new(RequestScope::new(cancel.clone(), request_timeout)),
            cancel,
            pool: None,
        }
    }

    /// Cancel in-flight operations and release backend connections.
    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}

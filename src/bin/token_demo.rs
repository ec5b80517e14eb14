use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokenwright::application_impl::*;
use tokenwright::application_port::*;
use tokenwright::domain_model::*;
use tokenwright::domain_port::*;
use tokenwright::infra_memory::*;
use tokenwright::infra_system::*;
use tokenwright::logger::*;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap(LogFormat::Plain);
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryRefreshTokenStore::new(clock.clone()));
    let crypto = Arc::new(JwtArgon2CryptoService::try_new(
        CryptoConfig {
            access_token_ttl: Duration::from_secs(900),
            signing_key: b"demo-secret".to_vec(),
            refresh_token_length: 32,
            hash_cost: DEFAULT_HASH_COST,
        },
        clock.clone(),
        Arc::new(OsEntropy),
    )?);
    let auth = RealAuthService::new(crypto, store.clone(), clock.clone(), Duration::from_secs(3600));
    let cancel = CancellationToken::new();
    let subject = SubjectId::new("demo-user");

    let first = auth.login(&cancel, &subject).await?;
    info!(?first, records = store.len(), "login");

    clock.advance(chrono::Duration::seconds(60));
    let second = auth
        .refresh(&cancel, &first.access_token, &first.refresh_token)
        .await?;
    info!(?second, "refresh");

    match auth
        .refresh(&cancel, &first.access_token, &first.refresh_token)
        .await
    {
        Ok(_) => error!("rotated refresh token was accepted again"),
        Err(e) => info!(kind = ?e.kind(), "reuse rejected: {}", e),
    }

    clock.advance(chrono::Duration::hours(2));
    match auth
        .refresh(&cancel, &second.access_token, &second.refresh_token)
        .await
    {
        Ok(_) => error!("stale pair was accepted"),
        Err(e) => info!(kind = ?e.kind(), "stale pair rejected: {}", e),
    }

    Ok(())
}

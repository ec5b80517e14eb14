use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokenwright::api;
use tokenwright::application_impl::*;
use tokenwright::application_port::*;
use tokenwright::domain_model::*;
use tokenwright::infra_memory::*;
use tokenwright::infra_system::OsEntropy;
use tokenwright::server::Server;
use tokio_util::sync::CancellationToken;
use warp::http::StatusCode;

fn memory_auth_service() -> Arc<dyn AuthService> {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryRefreshTokenStore::new(clock.clone()));
    let crypto = JwtArgon2CryptoService::try_new(
        CryptoConfig {
            access_token_ttl: Duration::from_secs(900),
            signing_key: b"http-secret".to_vec(),
            refresh_token_length: 32,
            hash_cost: DEFAULT_HASH_COST,
        },
        clock.clone(),
        Arc::new(OsEntropy),
    )
    .unwrap();
    Arc::new(RealAuthService::new(
        Arc::new(crypto),
        store,
        clock,
        Duration::from_secs(3600),
    ))
}

async fn post(server: &Arc<Server>, path: &str, body: Value) -> (StatusCode, Value) {
    let routes = api::routes(server.clone());
    let res = warp::test::request()
        .method("POST")
        .path(path)
        .json(&body)
        .reply(&routes)
        .await;
    let body = serde_json::from_slice(res.body()).unwrap();
    (res.status(), body)
}

fn memory_server() -> Arc<Server> {
    Arc::new(Server::new(memory_auth_service(), Duration::from_secs(5)))
}

#[tokio::test]
async fn login_and_refresh_over_http() {
    let server = memory_server();

    let (status, body) = post(&server, "/api/v1/login", json!({"guid": "user-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());
    let access_token = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert!(!access_token.is_empty());
    assert!(!refresh_token.is_empty());

    let pair = json!({"access_token": access_token, "refresh_token": refresh_token});
    let (status, body) = post(&server, "/api/v1/refresh", pair.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["data"]["refresh_token"], refresh_token.as_str());

    let (status, body) = post(&server, "/api/v1/refresh", pair).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "InvalidToken");
}

#[tokio::test]
async fn empty_or_missing_fields_are_bad_requests() {
    let server = memory_server();

    let (status, body) = post(&server, "/api/v1/login", json!({"guid": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidRequest");
    assert_eq!(body["error"]["message"], "invalid guid");

    let (status, body) = post(&server, "/api/v1/refresh", json!({"refresh_token": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "invalid access token");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let routes = api::routes(memory_server());
    let res = warp::test::request()
        .method("POST")
        .path("/api/v1/login")
        .header("content-type", "application/json")
        .body("{\"guid\": ")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["error"]["code"], "InvalidRequest");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body) = post(&memory_server(), "/api/v1/logout", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NotFound");
}

#[tokio::test]
async fn get_on_unknown_route_is_not_found() {
    let routes = api::routes(memory_server());
    let res = warp::test::request()
        .method("GET")
        .path("/api/v1/nope")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["error"]["code"], "NotFound");
}

#[tokio::test]
async fn get_is_not_allowed() {
    let routes = api::routes(memory_server());
    let res = warp::test::request()
        .method("GET")
        .path("/api/v1/login")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn storage_failures_do_not_leak_details() {
    let server = Arc::new(Server::new(Arc::new(Failing), Duration::from_secs(5)));
    let (status, body) = post(&server, "/api/v1/login", json!({"guid": "user-1"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "InternalError");
    assert_eq!(body["error"]["message"], "Internal error");
}

#[tokio::test]
async fn slow_requests_hit_the_deadline() {
    let server = Arc::new(Server::new(Arc::new(Hanging), Duration::from_millis(20)));
    let (status, body) = post(&server, "/api/v1/login", json!({"guid": "user-1"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "Cancelled");
    assert_eq!(body["error"]["message"], "deadline exceeded");
}

#[tokio::test]
async fn requests_after_shutdown_are_cancelled() {
    let server = memory_server();
    server.shutdown().await;
    let (status, body) = post(&server, "/api/v1/login", json!({"guid": "user-1"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["message"], "operation cancelled");
}

struct Failing;

#[async_trait::async_trait]
impl AuthService for Failing {
    async fn login(
        &self,
        _cancel: &CancellationToken,
        _subject_id: &SubjectId,
    ) -> Result<TokenPair, AuthError> {
        Err(AuthError::Storage(
            "failed to save refresh token: connection refused (10.0.0.7:6379)".to_string(),
        ))
    }

    async fn refresh(
        &self,
        _cancel: &CancellationToken,
        _access_token: &AccessToken,
        _refresh_token: &RefreshToken,
    ) -> Result<TokenPair, AuthError> {
        Err(AuthError::Storage("failed to get refresh token".to_string()))
    }
}

struct Hanging;

#[async_trait::async_trait]
impl AuthService for Hanging {
    async fn login(
        &self,
        _cancel: &CancellationToken,
        _subject_id: &SubjectId,
    ) -> Result<TokenPair, AuthError> {
        std::future::pending().await
    }

    async fn refresh(
        &self,
        _cancel: &CancellationToken,
        _access_token: &AccessToken,
        _refresh_token: &RefreshToken,
    ) -> Result<TokenPair, AuthError> {
        std::future::pending().await
    }
}

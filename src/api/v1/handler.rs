use super::error::*;
use crate::application_port::AuthService;
use crate::domain_model::*;
use crate::server::RequestScope;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

// Missing fields deserialize as empty and are rejected by the service as
// validation errors, same as explicitly empty ones.

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub guid: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: RefreshToken,
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    scope: Arc<RequestScope>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let subject_id = SubjectId(body.guid);
    let cancel = scope.child_token();

    let tokens = scope
        .with_deadline(auth_service.login(&cancel, &subject_id))
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

pub async fn refresh(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
    scope: Arc<RequestScope>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let cancel = scope.child_token();

    let tokens = scope
        .with_deadline(auth_service.refresh(&cancel, &body.access_token, &body.refresh_token))
        .await
        .map_err(ApiRejection::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

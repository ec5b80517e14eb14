use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, message) = if let Some(rejection) = err.find::<ApiRejection>() {
        (rejection.code, rejection.message.clone())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (ApiErrorCode::InvalidRequest, e.to_string())
    } else if err.is_not_found() {
        (ApiErrorCode::NotFound, ApiErrorCode::NotFound.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            ApiErrorCode::MethodNotAllowed,
            ApiErrorCode::MethodNotAllowed.to_string(),
        )
    } else if err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
    {
        (ApiErrorCode::InvalidRequest, format!("{:?}", err))
    } else {
        error!("Unhandled rejection: {:?}", err);
        (
            ApiErrorCode::InternalError,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let status = code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(code, message));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Request is malformed")]
    InvalidRequest,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Request was cancelled")]
    Cancelled,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A service failure already translated for the client.
#[derive(Debug)]
pub struct ApiRejection {
    pub code: ApiErrorCode,
    pub message: String,
}

impl reject::Reject for ApiRejection {}

impl From<AuthError> for ApiRejection {
    fn from(error: AuthError) -> Self {
        let code = match error.kind() {
            AuthErrorKind::Validation => ApiErrorCode::InvalidRequest,
            AuthErrorKind::InvalidToken => ApiErrorCode::InvalidToken,
            AuthErrorKind::Cancelled => ApiErrorCode::Cancelled,
            AuthErrorKind::Crypto | AuthErrorKind::Storage => ApiErrorCode::InternalError,
        };
        let message = match code {
            // details of server faults stay in the log
            ApiErrorCode::InternalError => {
                error!(kind = ?error.kind(), "internal error: {}", error);
                code.to_string()
            }
            _ => {
                warn!(kind = ?error.kind(), "request rejected: {}", error);
                error.to_string()
            }
        };
        ApiRejection { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_keep_their_message() {
        let r = ApiRejection::from(AuthError::InvalidToken(
            "refresh token is expired".to_string(),
        ));
        assert_eq!(r.code, ApiErrorCode::InvalidToken);
        assert_eq!(r.code.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(r.message, "refresh token is expired");

        let r = ApiRejection::from(AuthError::Validation("invalid guid".to_string()));
        assert_eq!(r.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_faults_hide_details() {
        for err in [
            AuthError::Storage("failed to save refresh token: redis down".to_string()),
            AuthError::Crypto("failed to generate refresh token: rng".to_string()),
        ] {
            let r = ApiRejection::from(err);
            assert_eq!(r.code, ApiErrorCode::InternalError);
            assert_eq!(r.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(r.message, "Internal error");
        }
    }

    #[test]
    fn cancellation_is_unavailable() {
        let r = ApiRejection::from(AuthError::deadline_exceeded());
        assert_eq!(r.code.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

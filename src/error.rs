use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::ratelimit::RateLimitDecision;

/// Error taxonomy for the access-control core.
///
/// Authentication failures are deliberately opaque: bad password, unknown
/// email, expired token, revoked session and cross-tenant token use all
/// collapse into the same variant so the boundary leaks nothing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials or session")]
    Authentication,

    #[error("insufficient permissions")]
    Authorization,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("too many requests")]
    RateLimited(RateLimitDecision),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Authentication => (
                StatusCode::UNAUTHORIZED,
                "invalid credentials or session".to_string(),
            ),
            AppError::Authorization => (
                StatusCode::FORBIDDEN,
                "insufficient permissions".to_string(),
            ),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::RateLimited(_) => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests, slow down".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(err) => {
                // Full diagnostic context stays server-side; the caller
                // receives a redacted generic message.
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let mut res = (status, Json(ErrorBody { error: message })).into_response();

        if let AppError::RateLimited(decision) = self {
            let now = time::OffsetDateTime::now_utc();
            let retry_after = (decision.reset_at - now).whole_seconds().max(1);
            let headers = res.headers_mut();
            headers.insert(axum::http::header::RETRY_AFTER, retry_after.into());
            headers.insert("x-ratelimit-limit", decision.limit.into());
            headers.insert("x-ratelimit-remaining", decision.remaining.into());
            headers.insert(
                "x-ratelimit-reset",
                decision.reset_at.unix_timestamp().into(),
            );
        }

        res
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::UserSession;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("You may only access your own data")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The pipeline produced a `failed` result; carries its feedback text
    #[error("{0}")]
    AnalysisRejected(String),
    #[error("Database error")]
    Database(#[source] anyhow::Error),
    #[error("Storage error")]
    Storage(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AnalysisRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match &self {
            ApiError::InvalidRequest(_) => "Invalid request",
            ApiError::Forbidden => "Forbidden",
            ApiError::NotFound(_) => "Not found",
            ApiError::AnalysisRejected(_) => "Video analysis failed",
            ApiError::Database(e) => {
                error!("Database error: {:#}", e);
                "Database error"
            }
            ApiError::Storage(e) => {
                error!("Storage error: {:#}", e);
                "Storage error"
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Reject callers reading another user's data
pub fn ensure_user_access(session: &UserSession, user_id: i64) -> Result<(), ApiError> {
    if session.can_access_user(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Check an optional `limit`/`offset` pair against `1..=max_limit` and `offset >= 0`
pub fn validate_page(
    limit: Option<i64>,
    offset: Option<i64>,
    default_limit: i64,
    max_limit: i64,
) -> Result<(i64, i64), ApiError> {
    let limit = limit.unwrap_or(default_limit);
    let offset = offset.unwrap_or(0);

    if !(1..=max_limit).contains(&limit) {
        return Err(ApiError::InvalidRequest(format!(
            "limit must be between 1 and {}",
            max_limit
        )));
    }
    if offset < 0 {
        return Err(ApiError::InvalidRequest("offset must not be negative".to_string()));
    }

    Ok((limit, offset))
}

//! Error taxonomy shared by the store and the HTTP layer.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Malformed or missing input.
    #[error("{0}")]
    BadRequest(String),
    /// Missing, invalid or expired credential.
    #[error("{0}")]
    Unauthorized(String),
    /// Authenticated, but not permitted.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// The store aborted the unit of work; the caller may retry.
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GameError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        GameError::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        GameError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        GameError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GameError::NotFound(msg.into())
    }
}

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // serialization_failure / deadlock_detected
            if matches!(db_err.code().as_deref(), Some("40001" | "40P01")) {
                return GameError::Conflict("concurrent update, please retry".into());
            }
        }
        GameError::Internal(anyhow::Error::new(err))
    }
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self {
            GameError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GameError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Conflict(_) => StatusCode::CONFLICT,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            GameError::Internal(e) => {
                log::error!("internal error: {e:?}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

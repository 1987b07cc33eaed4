//! Error taxonomy for session operations.
//!
//! Every variant is reported synchronously to the caller; an operation that
//! returns an error has not touched the session.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::types::GamePhase;

pub type GameResult<T> = Result<T, GameError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("{action} is only allowed during {allowed} phase (current phase: {current})")]
    InvalidPhase {
        action: &'static str,
        allowed: &'static str,
        current: GamePhase,
    },

    #[error("Game not found")]
    NotFound,

    #[error("No hints remaining")]
    NoHintsRemaining,

    #[error("All {0} attempts have been used")]
    AttemptsExhausted(usize),
}

impl GameError {
    /// Stable machine-readable code sent alongside the human-readable detail
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Validation(_) => "VALIDATION_ERROR",
            GameError::InvalidPhase { .. } => "INVALID_PHASE",
            GameError::NotFound => "NOT_FOUND",
            GameError::NoHintsRemaining => "NO_HINTS_REMAINING",
            GameError::AttemptsExhausted(_) => "ATTEMPTS_EXHAUSTED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub detail: String,
}

/// Unreadable request bodies are malformed input like any other
impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        GameError::Validation(rejection.body_text())
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(code = self.code(), "Request rejected: {}", self);

        let body = ErrorBody {
            code: self.code().to_string(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

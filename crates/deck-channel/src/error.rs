use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use podium_deck_interface::{ErrorDetails, ErrorResponse, InterfaceError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("presenter role required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Deck not found: {0}")]
    NotFound(String),
}

impl From<InterfaceError> for DeckError {
    fn from(err: InterfaceError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for DeckError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            Self::Validation(message) => (StatusCode::BAD_REQUEST, "validation_failed", message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetails {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

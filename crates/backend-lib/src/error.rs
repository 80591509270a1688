// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chamber_common::{ConnectionId, SeatNumber, ServerToClient};
use thiserror::Error;

use crate::validation::ValidationError;

/// Application error types with error codes and context.
///
/// The first group are rejections produced by the state engine; they never
/// change state and are reported only to the connection that caused them.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authorized")]
    Unauthorized,

    #[error("No active session")]
    SessionInactive,

    #[error("Seat {0} does not exist")]
    SeatNotFound(SeatNumber),

    #[error("Seat {0} is already occupied")]
    SeatOccupied(SeatNumber),

    #[error("Connection {0} has not joined")]
    NotFound(ConnectionId),

    #[error("Connection {0} has already joined")]
    DuplicateConnection(ConnectionId),

    #[error("User {0} is already connected")]
    UserAlreadyConnected(String),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::SeatNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionInactive
            | AppError::SeatOccupied(_)
            | AppError::DuplicateConnection(_)
            | AppError::UserAlreadyConnected(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "AUTH_001",
            AppError::SessionInactive => "SESSION_001",
            AppError::SeatNotFound(_) => "SEAT_001",
            AppError::SeatOccupied(_) => "SEAT_002",
            AppError::NotFound(_) => "CONN_001",
            AppError::DuplicateConnection(_) => "CONN_002",
            AppError::UserAlreadyConnected(_) => "CONN_003",
            AppError::InvalidInput(_) => "VAL_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// The `error` frame routed back to the originating connection
    pub fn to_server_message(&self) -> ServerToClient {
        ServerToClient::Error {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AppError::Internal("Chamber actor is not running".to_string())
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for AppError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        AppError::Internal("Chamber actor dropped the reply".to_string())
    }
}

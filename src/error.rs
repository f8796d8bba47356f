// ABOUTME: Centralized error handling with HTTP status mapping and logging
// ABOUTME: Keeps internal store failure detail out of client-facing responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    MissingFields(&'static str),
    UsernameTooShort,
    PasswordTooShort,
    UsernameTaken,
    InvalidCredentials,
    InvalidGameData,
    UserNotFound,
    MethodNotAllowed,
    Store(anyhow::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingFields(msg) => write!(f, "{}", msg),
            AppError::UsernameTooShort => write!(f, "Username must be at least 3 characters"),
            AppError::PasswordTooShort => write!(f, "Password must be at least 6 characters"),
            AppError::UsernameTaken => write!(f, "Username already exists"),
            AppError::InvalidCredentials => write!(f, "Invalid username or password"),
            AppError::InvalidGameData => write!(f, "Invalid game data"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::Store(err) => write!(f, "Store error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MissingFields(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
            AppError::UsernameTooShort | AppError::PasswordTooShort => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::UsernameTaken => (StatusCode::CONFLICT, self.to_string()),
            AppError::InvalidCredentials => {
                tracing::warn!("Rejected login attempt");
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::InvalidGameData => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::UserNotFound => {
                tracing::info!("Requested user not found");
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            AppError::Store(err) => {
                tracing::error!("Store error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage operation failed".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

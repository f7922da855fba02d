use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Startup-only failures. Never crosses a request boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cant bind to the Socket")]
    SocketBind,
    #[error("Cant connect to the DB")]
    DbConnect,
    #[error("Cant start the server")]
    ServerStart,
    #[error("JWT_SECRET must be set")]
    MissingSecret,
}

/// Request-level error taxonomy. Every variant maps to a status code and
/// is serialized as a `{message}` body, nothing else leaks to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Missing Auth Header")]
    MissingCredentials,
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Incorrect username or password")]
    Unauthorized,
    #[error("Admins Only Allowed")]
    Forbidden,
    #[error("Invalid Course ID")]
    InvalidId,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Internal Server Error")]
    Internal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::MissingCredentials | ApiError::Unauthenticated | ApiError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            // the role failure keeps the original API's 404, not 403
            ApiError::Forbidden | ApiError::InvalidId | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.to_string(),
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store operation failed");
        ApiError::Internal
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{jwt::TokenError, password::PasswordError};

/// Everything a signup or signin request can fail with. Client-expected
/// outcomes map straight to their status code; storage and internal
/// faults are logged with detail and answered with a generic 500 body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("user already signed in")]
    AlreadySignedIn,
    #[error("signin token expired or invalid")]
    InvalidBearer(#[source] TokenError),
    #[error("missing or malformed authorization header")]
    MissingBearer,
    #[error("user for this token no longer exists")]
    UnknownUser,
    #[error("incorrect password")]
    WrongPassword,
    #[error("stored password hash is unreadable")]
    CorruptCredential,
    #[error("user with this email does not exist, try signing up")]
    NotFound,
    #[error("user with this email already exists, try signing in")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::MalformedHash => AuthError::CorruptCredential,
            PasswordError::Hash => AuthError::Internal(anyhow::anyhow!(err)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
            AuthError::AlreadySignedIn => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::InvalidBearer(_)
            | AuthError::MissingBearer
            | AuthError::UnknownUser
            | AuthError::WrongPassword => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::CorruptCredential => {
                // Fail closed: the client sees an ordinary authentication
                // failure, the corrupted row is a server-side incident.
                error!("stored password hash failed to parse");
                (
                    StatusCode::UNAUTHORIZED,
                    AuthError::WrongPassword.to_string(),
                )
            }
            AuthError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AuthError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            AuthError::Storage(e) => {
                error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong, try again".to_string(),
                )
            }
            AuthError::Internal(e) => {
                error!(error = %e, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "something went wrong, try again".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use keel_core::error::error_response;

/// Users service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum UsersServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("account not found")]
    AccountNotFound,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("email not registered")]
    EmailNotRegistered,
    #[error("invalid id")]
    InvalidId,
    #[error("invalid password")]
    InvalidPassword,
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("missing data")]
    MissingData,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl UsersServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::UserAlreadyExists => "USER_ALREADY_EXISTS",
            Self::EmailNotRegistered => "EMAIL_NOT_REGISTERED",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::MissingData => "MISSING_DATA",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound | Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists | Self::EmailNotRegistered => StatusCode::CONFLICT,
            Self::InvalidId | Self::InvalidPassword | Self::PasswordMismatch | Self::MissingData => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UsersServiceError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), &self.to_string())
    }
}

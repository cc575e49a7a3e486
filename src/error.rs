//! Application error type and its mapping to HTTP responses.
//!
//! Every service and handler returns `Result<T, AppError>`. Nothing propagates past
//! the request boundary: form-level errors are usually caught by the handler and
//! rendered inline, the rest become a status page here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::views::{ErrorPage, NavContext};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("no account matches this email")]
    UnknownUser,

    #[error("the password does not match")]
    InvalidCredentials,

    #[error("not found")]
    NotFound,

    #[error("comment text is empty")]
    EmptyComment,

    /// An admin-only action was attempted by an anonymous user or a reader.
    #[error("administrator access required")]
    Unauthorized,

    #[error("a post with this title already exists")]
    DuplicateTitle,

    /// A submitted form field is missing or malformed. The message is user-facing.
    #[error("{0}")]
    Validation(String),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DuplicateEmail | Self::DuplicateTitle => StatusCode::CONFLICT,
            Self::UnknownUser | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EmptyComment | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Repository(_) | Self::Session(_) | Self::PasswordHash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The text shown to the visitor. Login failures share one message so the form
    /// does not reveal which emails are registered; internal details are never shown.
    pub fn user_message(&self) -> String {
        match self {
            Self::DuplicateEmail => {
                "There is an existing user with this email! Try to login with your credentials"
                    .to_string()
            }
            Self::UnknownUser | Self::InvalidCredentials => {
                "Please try again! Wrong credentials".to_string()
            }
            Self::NotFound => "The page you requested does not exist.".to_string(),
            Self::EmptyComment => "A comment cannot be empty.".to_string(),
            Self::Unauthorized => "Only the administrator can do that.".to_string(),
            Self::DuplicateTitle => "A post with this title already exists.".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::Repository(_) | Self::Session(_) | Self::PasswordHash(_) => {
                "Something went wrong on our side.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let page = ErrorPage {
            nav: NavContext::default(),
            status: status.as_u16(),
            message: self.user_message(),
        };

        (status, page).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

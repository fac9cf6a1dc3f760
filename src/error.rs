use axum::Json;
use axum::response::IntoResponse;
use reqwest::StatusCode;

use crate::workflow::ValidationErrors;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("{0}")]
    Ledger(String),

    #[error("{0}")]
    Upload(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    ApiError(#[from] ApiError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Reqwest(_) => (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response(),
            Error::Ledger(e) => {
                tracing::error!(%e, "ledger error");
                (StatusCode::BAD_GATEWAY, e).into_response()
            }
            Error::Upload(e) => {
                tracing::error!(%e, "upload error");
                (StatusCode::BAD_GATEWAY, e).into_response()
            }
            Error::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Error::ApiError(api_error) => match api_error {
                ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
                ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
                ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            },
        }
    }
}

//! Request-level errors and their HTML responses.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::store::StoreError;
use crate::views;

/// Errors a task action can end in.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No task matches the requested id, or the id is absent or malformed.
    #[error("not found")]
    NotFound,

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound | Self::Store(StoreError::Missing(_)) => not_found(),
            Self::Store(StoreError::Database(e)) => {
                tracing::error!(error = %e, "persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::status_page(
                        "Error",
                        "An error occurred while processing your request.",
                    )),
                )
                    .into_response()
            }
        }
    }
}

/// 404 page.
#[must_use]
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(views::status_page(
            "Not Found",
            "The requested task does not exist.",
        )),
    )
        .into_response()
}

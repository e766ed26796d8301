// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use axum::{
    extract::Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::pages;

/// Field name to messages, in the shape the matrix page scripts expect.
/// Errors that do not belong to a single field use the key `__all__`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "__all__";

/// Our error type for the application.
///
/// Every JSON variant renders as `{"success": false, "error": ...}` with a
/// matching status code, so the browser scripts only check one flag.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid form data")]
    Validation(FieldErrors),
    #[error("Authentication required.")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    /// Not-found for server-rendered pages.
    #[error("{0}")]
    PageNotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::PageNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        match self {
            Self::Internal(err) => {
                // The cause stays in the log; the client gets a generic message.
                tracing::error!("Internal server error: {:?}", err);
                (
                    code,
                    Json(serde_json::json!({
                        "success": false,
                        "error": "An internal error occurred."
                    })),
                )
                    .into_response()
            }
            Self::Validation(errors) => {
                tracing::debug!("Responding with validation errors: {:?}", errors);
                (
                    code,
                    Json(serde_json::json!({ "success": false, "errors": errors })),
                )
                    .into_response()
            }
            Self::PageNotFound(message) => {
                tracing::debug!("Page not found: {}", message);
                (code, Html(pages::not_found(&message))).into_response()
            }
            other => {
                let message = other.to_string();
                tracing::warn!(
                    "Responding with error: status_code={}, message={}",
                    code.as_u16(),
                    message
                );
                (
                    code,
                    Json(serde_json::json!({ "success": false, "error": message })),
                )
                    .into_response()
            }
        }
    }
}

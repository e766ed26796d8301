// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod admin;
pub mod analytics;
pub mod pomodoro;
pub mod site;
pub mod tasks;
pub mod users;

use axum::{
    extract::{
        Form, Json,
        rejection::{FormRejection, JsonRejection},
    },
    http::Uri,
};
use tracing::debug;

use crate::error::AppError;

/// Unwraps a JSON body, turning a malformed one into a 400 with our error shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected JSON body: {}", rejection.body_text());
            Err(AppError::BadRequest(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    }
}

/// Same as [`json_body`] for url-encoded bodies posted by the page scripts.
pub(crate) fn form_body<T>(payload: Result<Form<T>, FormRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Form(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected form body: {}", rejection.body_text());
            Err(AppError::BadRequest(format!(
                "Invalid form data: {}",
                rejection.body_text()
            )))
        }
    }
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::PageNotFound(format!("No page at {}", uri.path()))
}

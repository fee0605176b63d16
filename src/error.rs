use std::collections::BTreeMap;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::RepoError;
use crate::ml::MlError;
use crate::predictions::service::PredictionError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Field name -> messages, rendered as the `errors` object of a 422 response.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn check(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }

    pub fn single(field: &str, message: impl Into<String>) -> ApiError {
        let mut errors = Self::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("Unauthorized")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Prediction failed")]
    Prediction(#[from] PredictionError),
    #[error("ML service is unavailable. Please try again later.")]
    MlUnavailable(#[source] MlError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Prediction(e) => e.status(),
            ApiError::MlUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Repo(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ValidationErrors::single("body", e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ValidationErrors::single("query", e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound("Record")
    }
}

// Anything that is not multipart/form-data carries no image
impl From<MultipartRejection> for ApiError {
    fn from(_: MultipartRejection) -> Self {
        ValidationErrors::single("image", "The image field is required.")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation(errors) => json!({
                "message": self.to_string(),
                "errors": errors,
            }),
            ApiError::Prediction(e) => json!({
                "message": self.to_string(),
                "error": e.to_string(),
            }),
            ApiError::Repo(_) | ApiError::Internal(_) => json!({ "message": "Server Error" }),
            _ => json!({ "message": self.to_string() }),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = ?self, "request failed");
        }

        (status, Json(body)).into_response()
    }
}

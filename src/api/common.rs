//! Shared API response types
//!
//! Every error leaving the API is a JSON body with a `message` field;
//! validation failures additionally carry a per-field `errors` map.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::error;

use crate::models::ValidationErrors;
use crate::services::{ArticleServiceError, CreatorServiceError, UserServiceError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Internal failures log the cause and answer with a generic message.
    pub fn internal(error: anyhow::Error) -> Self {
        error!("Internal error: {:#}", error);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation failed".to_string(),
            errors: Some(errors.fields().clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.errors {
            Some(errors) => json!({ "message": self.message, "errors": errors }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(error: ArticleServiceError) -> Self {
        match error {
            ArticleServiceError::NotFound => ApiError::not_found("Article not found"),
            ArticleServiceError::NotOwner => {
                ApiError::unauthorized("Article belongs to another creator")
            }
            ArticleServiceError::Validation(errors) => ApiError::validation(errors),
            ArticleServiceError::Internal(error) => ApiError::internal(error),
        }
    }
}

impl From<CreatorServiceError> for ApiError {
    fn from(error: CreatorServiceError) -> Self {
        match error {
            CreatorServiceError::NotFound => ApiError::not_found("Creator not found"),
            CreatorServiceError::EmailTaken => ApiError::conflict("Email is already registered"),
            CreatorServiceError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            CreatorServiceError::Validation(errors) => ApiError::validation(errors),
            CreatorServiceError::Internal(error) => ApiError::internal(error),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(error: UserServiceError) -> Self {
        match error {
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::EmailTaken => ApiError::conflict("Email is already registered"),
            UserServiceError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            UserServiceError::Validation(errors) => ApiError::validation(errors),
            UserServiceError::Internal(error) => ApiError::internal(error),
        }
    }
}

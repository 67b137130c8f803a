use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use serde::Serialize;

use crate::extract::ExtractionError;
use crate::fetcher::FetchError;

#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("fetch failed: {0}")]
    Upstream(String),

    #[error("{0}")]
    Extraction(String),

    #[error("{message}")]
    Unexpected {
        message: String,
        stack: Option<String>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Extraction(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unexpected { .. } | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let stack = match &self {
            AppError::Unexpected { stack, .. } => stack.clone(),
            _ => None,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            stack,
        });

        (status, body).into_response()
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::Extraction(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        let stack = format!("{:?}", err);
        AppError::Unexpected {
            message: format!("extraction task failed: {}", err),
            stack: Some(stack),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(AppError::Validation("invalid url".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Extraction("too short".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Upstream("404".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            AppError::Unexpected { message: "boom".into(), stack: None }.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_message_embeds_status() {
        let err = AppError::from(FetchError::Status(404));
        assert_eq!(err.to_string(), "fetch failed: 404");
    }

    #[test]
    fn validation_message_is_verbatim() {
        assert_eq!(AppError::Validation("domain not allowed".into()).to_string(), "domain not allowed");
    }
}

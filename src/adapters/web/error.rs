//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::AnalyzerError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &AnalyzerError) -> StatusCode {
    match err {
        AnalyzerError::ConfigParse { .. }
        | AnalyzerError::ConfigInvalid { .. }
        | AnalyzerError::UnknownPeriod(_)
        | AnalyzerError::UnknownRiskProfile(_)
        | AnalyzerError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        AnalyzerError::NoData { .. } => StatusCode::NOT_FOUND,
        AnalyzerError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AnalyzerError::DataSource { .. }
        | AnalyzerError::DataSourceStatus { .. }
        | AnalyzerError::DataSourceParse { .. } => StatusCode::BAD_GATEWAY,
        AnalyzerError::Cache { .. } | AnalyzerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AnalyzerError> for WebError {
    fn from(err: AnalyzerError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

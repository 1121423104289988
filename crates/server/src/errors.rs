use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, error};

use service::ServiceError;

use crate::metrics;

/// JSON error body: `{ "error", "code", "detail" }`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub code: Option<u16>,
    pub detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

fn classify(err: &ServiceError) -> (StatusCode, &'static str) {
    match err {
        ServiceError::InvalidCoordinate(_) => (StatusCode::BAD_REQUEST, "Invalid Coordinate"),
        ServiceError::InvalidCursor(_) => (StatusCode::BAD_REQUEST, "Invalid Cursor"),
        ServiceError::InvalidLimit(_) => (StatusCode::BAD_REQUEST, "Invalid Limit"),
        ServiceError::Validation(_) | ServiceError::Model(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
        ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
        ServiceError::DataSource { .. } => (StatusCode::SERVICE_UNAVAILABLE, "Data Source Unavailable"),
        ServiceError::StrategyUnavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Strategy Unavailable"),
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(err: ServiceError) -> Self {
        let (status, title) = classify(&err);
        let code = err.code();
        metrics::REQUEST_ERRORS.with_label_values(&[&code.to_string()]).inc();
        if status.is_server_error() {
            error!(code, error = %err, "request failed");
        } else {
            debug!(code, error = %err, "request rejected");
        }
        Self { status, title: title.to_string(), code: Some(code), detail: Some(err.to_string()) }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: &self.title, code: self.code, detail: self.detail.as_deref() };
        (self.status, Json(body)).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use farmxpress_payments::PaymentError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type AppSuccess = GenericResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericResponse {
    pub status: u16,
    pub message: String,
    pub data: serde_json::Value,
}

impl GenericResponse {
    pub fn new(status: StatusCode, message: &str, data: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            message: message.to_string(),
            data,
        }
    }
}

impl IntoResponse for GenericResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            Json::from(self),
        )
            .into_response()
    }
}

/// JSON error for interactive callers, rendered as `{error, message}`.
#[derive(Debug)]
pub struct AppError(pub StatusCode, pub anyhow::Error);

impl AppError {
    pub fn new(status: StatusCode, err: anyhow::Error) -> Self {
        Self(status, err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        } else {
            tracing::warn!("CODE: {}, MESSAGE: {}", self.0.as_u16(), self.1);
        }
        let error = self.0.canonical_reason().unwrap_or("Error");
        (self.0, Json(json!({ "error": error, "message": self.1.to_string() }))).into_response()
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let status = match &err {
            PaymentError::Validation(_) => StatusCode::BAD_REQUEST,
            PaymentError::Auth => StatusCode::UNAUTHORIZED,
            PaymentError::Provider { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(StatusCode::is_client_error)
                .unwrap_or(StatusCode::BAD_GATEWAY),
            PaymentError::NotConfigured(_) | PaymentError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        match err {
            PaymentError::Internal(e) => {
                tracing::error!("[AppError] store failure: {}", e);
                Self(status, anyhow::anyhow!("Internal error"))
            }
            PaymentError::NotConfigured(what) => {
                tracing::error!("[AppError] {} not configured", what);
                Self(status, anyhow::anyhow!("Payment service not configured"))
            }
            other => Self(status, anyhow::anyhow!(other.to_string())),
        }
    }
}

/// Plain-text reply for provider callbacks.
pub fn plain(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

pub fn webhook_failure(err: &PaymentError) -> Response {
    match err {
        PaymentError::Auth => plain(StatusCode::UNAUTHORIZED, "Unauthorized"),
        PaymentError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()).into_response(),
        other => {
            tracing::error!("[xendit_webhook] {}", other);
            plain(StatusCode::INTERNAL_SERVER_ERROR, "Error processing webhook")
        }
    }
}

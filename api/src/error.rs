use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use qamus_lib::QamusError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Qamus(#[from] QamusError),

    #[error("Accounts are not available with the {0} backend")]
    AuthUnavailable(&'static str),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Qamus(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::AuthUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        }
        let body = match &self {
            ApiError::Qamus(e) => json!(e),
            ApiError::AuthUnavailable(_) => json!({
                "kind": "auth_unavailable",
                "status": status.as_u16(),
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

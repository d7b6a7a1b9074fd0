use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::db::StoreError;

/// Errors surfaced by the services. Every variant is reported synchronously;
/// none of them is transient.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    /// Login or e-mail collision. Kept apart from `Validation` so clients can
    /// tell "fix your input" from "pick another login".
    #[error("{field} já está em uso")]
    AlreadyUsed { field: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Acesso negado")]
    Forbidden,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn already_used(field: impl Into<String>) -> Self {
        AppError::AlreadyUsed { field: field.into() }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::AlreadyUsed { .. } => (StatusCode::BAD_REQUEST, "already_used"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { field } => AppError::AlreadyUsed { field },
            StoreError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        let mut body = json!({ "error": self.to_string(), "code": code });
        if let AppError::AlreadyUsed { field } = &self {
            body["field"] = json!(field);
        }
        (status, Json(body)).into_response()
    }
}

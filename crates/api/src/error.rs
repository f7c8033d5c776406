use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkup_core::error::CoreError;
use serde_json::json;

/// Error returned by onboarding and lookup handlers.
///
/// Renders as `{ "success": false, "message", "code" }`. The payment webhook
/// uses [`AppError::classify`] directly and writes its own envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Never shown to callers.
    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// HTTP status, stable error code, and the message safe to show callers.
    ///
    /// 5xx details are replaced with a generic message. Nothing is logged
    /// here; the caller that renders the error owns the log event.
    pub fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidOtp => {
                    (StatusCode::BAD_REQUEST, "INVALID_OTP", core.to_string())
                }
                CoreError::InvalidReferralCode => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_REFERRAL_CODE",
                    core.to_string(),
                ),
                CoreError::SelfReferralNotAllowed => (
                    StatusCode::BAD_REQUEST,
                    "SELF_REFERRAL_NOT_ALLOWED",
                    core.to_string(),
                ),
                CoreError::MalformedWebhook(_) => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_WEBHOOK", core.to_string())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(_) => internal(),
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(_) => internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = json!({
            "success": false,
            "message": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// `RowNotFound` is a 404 and a `uq_*` violation that escaped a repository
/// retry is a 409. Anything else is hidden behind a 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if linkup_db::is_unique_violation(err, None) {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Record already exists ({constraint})"),
                    );
                }
            }
            internal()
        }
        _ => internal(),
    }
}

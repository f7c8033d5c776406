#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use linkup_core::phone::PhoneNumber;
use linkup_core::plans::PlanCatalog;
use sqlx::PgPool;
use tower::ServiceExt;

use linkup_api::config::ServerConfig;
use linkup_api::otp_sender::{OtpDeliveryError, OtpSender};
use linkup_api::router::build_app_router;
use linkup_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        otp_ttl_secs: 300,
        plan_catalog_file: None,
    }
}

/// Captures every OTP handed to it so tests can complete verification.
#[derive(Default)]
pub struct RecordingOtpSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingOtpSender {
    /// Most recent code sent to `phone_number`.
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(phone, _)| phone == phone_number)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpSender for RecordingOtpSender {
    async fn send(&self, phone: &PhoneNumber, code: &str) -> Result<(), OtpDeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((phone.phone_number.clone(), code.to_string()));
        Ok(())
    }
}

/// Always fails, to show delivery errors do not fail initiation.
pub struct FailingOtpSender;

#[async_trait]
impl OtpSender for FailingOtpSender {
    async fn send(&self, _phone: &PhoneNumber, _code: &str) -> Result<(), OtpDeliveryError> {
        Err(OtpDeliveryError("gateway unavailable".to_string()))
    }
}

/// Build the full application router with the default plan catalog and a
/// recording OTP sender.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_sender(pool, Arc::new(RecordingOtpSender::default()))
}

pub fn build_test_app_with_sender(pool: PgPool, sender: Arc<dyn OtpSender>) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), PlanCatalog::default(), sender);
    build_app_router(state, &config).unwrap()
}

/// Build the app and hand back the sender for OTP inspection.
pub fn build_recording_app(pool: PgPool) -> (Router, Arc<RecordingOtpSender>) {
    let sender = Arc::new(RecordingOtpSender::default());
    let app = build_test_app_with_sender(pool, sender.clone());
    (app, sender)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, "application/json", body.to_string()).await
}

pub async fn post_raw(
    app: Router,
    uri: &str,
    content_type: &str,
    body: impl Into<String>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(body.into()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

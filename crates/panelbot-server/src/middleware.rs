use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use panelbot_core::ErrorKind;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Shared-secret gate settings.
#[derive(Clone)]
pub struct AuthState {
    secret: Option<Arc<str>>,
}

impl AuthState {
    /// `None` disables the gate; the config loader refuses that in production.
    #[must_use]
    pub fn new(secret: Option<&str>) -> Self {
        if secret.is_none() {
            tracing::warn!("PANELBOT_API_SECRET not set; x-api-key check disabled");
        }
        Self {
            secret: secret.map(Arc::from),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.secret.is_some()
    }

    fn allows(&self, candidate: &str) -> bool {
        self.secret
            .as_deref()
            .is_some_and(|secret| secret.as_bytes().ct_eq(candidate.as_bytes()).into())
    }
}

/// Uses the caller's `x-request-id` when present, otherwise a fresh `UUIDv4`;
/// the id is stored as a [`RequestId`] extension and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

/// Rejects requests whose `x-api-key` does not match the configured secret.
pub async fn require_api_key(State(auth): State<AuthState>, req: Request, next: Next) -> Response {
    if !auth.enabled() {
        return next.run(req).await;
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if auth.allows(key) => next.run(req).await,
        _ => {
            tracing::warn!(path = %req.uri().path(), "rejected request with missing or invalid api key");
            ApiError::new(ErrorKind::NaoAutorizado, "Chave de API ausente ou inválida").into_response()
        }
    }
}

mod catalog;
mod customers;
mod menus;
mod orders;
mod session;
mod submit;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use panelbot_browser::{BrowserError, BrowserLauncher};
use panelbot_core::{AppConfig, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, require_api_key, AuthState, API_KEY_HEADER, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub launcher: Arc<dyn BrowserLauncher>,
}

/// Error body shared by every route: `{error, tipo, detalhes, codigo}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub tipo: ErrorKind,
    pub detalhes: String,
    pub codigo: u16,
}

impl ApiError {
    pub fn new(kind: ErrorKind, detalhes: impl Into<String>) -> Self {
        Self {
            error: kind.summary().to_owned(),
            tipo: kind,
            detalhes: detalhes.into(),
            codigo: kind.status_code(),
        }
    }

    pub(super) fn invalid_request(detalhes: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::RequisicaoInvalida, detalhes.to_string())
    }
}

impl From<BrowserError> for ApiError {
    fn from(err: BrowserError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Interno {
            tracing::error!(error = %err, "scrape failed");
        } else {
            tracing::warn!(error = %err, tipo = ?kind, "scrape failed");
        }
        Self::new(kind, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.codigo).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// `email` / `senha` query parameters accepted by every scraping GET route.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CredentialParams {
    pub email: Option<String>,
    pub senha: Option<String>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/pedidos", get(orders::list_orders))
        .route("/api/pedidos/{id}", get(orders::get_order))
        .route("/api/cardapio", get(menus::list_menus))
        .route("/api/cardapio-sab", get(catalog::list_catalog))
        .route("/api/cardapio-sab/produtos", get(catalog::list_products))
        .route("/api/clientes-sab", get(customers::list_customers))
        .route("/api/envia-pedido", post(submit::submit_order))
        .layer(axum::middleware::from_fn_with_state(auth, require_api_key))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id))
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "panelbot: API de automação dos painéis Saborite e PlusDelivery",
        "endpoints": {
            "pedidos": "/api/pedidos",
            "pedido": "/api/pedidos/{id}",
            "cardapio": "/api/cardapio",
            "cardapio_sab": "/api/cardapio-sab",
            "produtos_sab": "/api/cardapio-sab/produtos",
            "clientes_sab": "/api/clientes-sab",
            "envia_pedido": "/api/envia-pedido"
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

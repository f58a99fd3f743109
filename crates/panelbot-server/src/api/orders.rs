//! PlusDelivery orders: `GET /api/pedidos` and `GET /api/pedidos/{id}`.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use panelbot_browser::sites::plus_delivery::{self, DEFAULT_ORDER_LIMIT};
use panelbot_core::Order;
use serde::{Deserialize, Serialize};

use super::{session::BrowserSession, ApiError, AppState, CredentialParams};

const MAX_ORDER_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(super) struct OrdersQuery {
    email: Option<String>,
    senha: Option<String>,
    limite: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrdersResponse {
    pub sucesso: bool,
    pub pedidos: Vec<Order>,
    pub total_pedidos: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderResponse {
    pub sucesso: bool,
    pub pedido: Order,
}

pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_ORDER_LIMIT).clamp(1, MAX_ORDER_LIMIT)
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let Query(query) = query.map_err(ApiError::invalid_request)?;
    let limit = normalize_limit(query.limite);
    let params = CredentialParams {
        email: query.email,
        senha: query.senha,
    };

    let session = BrowserSession::plus_delivery(&state, &params).await?;
    let result = plus_delivery::list_orders(session.driver(), &state.config.timings, limit).await;
    let pedidos = session.finish(result).await?;

    Ok(Json(OrdersResponse {
        sucesso: true,
        total_pedidos: pedidos.len(),
        pedidos,
    }))
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<CredentialParams>, QueryRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Query(params) = query.map_err(ApiError::invalid_request)?;
    let id = id.trim().trim_start_matches('#').trim().to_owned();
    if id.is_empty() {
        return Err(ApiError::invalid_request("id do pedido é obrigatório"));
    }

    let session = BrowserSession::plus_delivery(&state, &params).await?;
    let result = plus_delivery::find_order(session.driver(), &state.config.timings, &id).await;
    let pedido = session.finish(result).await?;

    Ok(Json(OrderResponse {
        sucesso: true,
        pedido,
    }))
}

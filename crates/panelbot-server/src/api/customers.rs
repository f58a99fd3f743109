//! Saborite customers: `GET /api/clientes-sab`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use panelbot_browser::sites::saborite;
use panelbot_core::Customer;
use serde::Serialize;

use super::{session::BrowserSession, ApiError, AppState, CredentialParams};

#[derive(Debug, Serialize)]
pub(super) struct CustomersResponse {
    pub sucesso: bool,
    pub clientes: Vec<Customer>,
    pub total_clientes: usize,
}

pub(super) async fn list_customers(
    State(state): State<AppState>,
    query: Result<Query<CredentialParams>, QueryRejection>,
) -> Result<Json<CustomersResponse>, ApiError> {
    let Query(params) = query.map_err(ApiError::invalid_request)?;

    let session = BrowserSession::saborite(&state, &params).await?;
    let result =
        saborite::scrape_customers(session.driver(), session.profile(), &state.config.timings).await;
    let clientes = session.finish(result).await?;

    Ok(Json(CustomersResponse {
        sucesso: true,
        total_clientes: clientes.len(),
        clientes,
    }))
}

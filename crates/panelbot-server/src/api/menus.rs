//! PlusDelivery menus: `GET /api/cardapio`.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use panelbot_browser::sites::plus_delivery;
use panelbot_core::MenuRow;
use serde::Serialize;

use super::{session::BrowserSession, ApiError, AppState, CredentialParams};

#[derive(Debug, Serialize)]
pub(super) struct MenusResponse {
    pub sucesso: bool,
    pub menus: Vec<MenuRow>,
    pub total_menus: usize,
    pub total_produtos: usize,
}

impl MenusResponse {
    pub(super) fn new(menus: Vec<MenuRow>) -> Self {
        Self {
            sucesso: true,
            total_menus: menus.len(),
            total_produtos: menus.iter().map(|menu| menu.products.len()).sum(),
            menus,
        }
    }
}

pub(super) async fn list_menus(
    State(state): State<AppState>,
    query: Result<Query<CredentialParams>, QueryRejection>,
) -> Result<Json<MenusResponse>, ApiError> {
    let Query(params) = query.map_err(ApiError::invalid_request)?;

    let session = BrowserSession::plus_delivery(&state, &params).await?;
    let result = plus_delivery::list_menus(session.driver(), &state.config.timings).await;
    let menus = session.finish(result).await?;

    Ok(Json(MenusResponse::new(menus)))
}

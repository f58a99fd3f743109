//! Saborite catalog: `GET /api/cardapio-sab` and `GET /api/cardapio-sab/produtos`.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use panelbot_browser::sites::saborite;
use panelbot_core::Product;
use serde::{Deserialize, Serialize};

use super::{session::BrowserSession, ApiError, AppState, CredentialParams};

/// Key for products listed outside any category group.
pub(super) const UNCATEGORIZED: &str = "Sem categoria";

#[derive(Debug, Deserialize)]
pub(super) struct CatalogQuery {
    email: Option<String>,
    senha: Option<String>,
    #[serde(default)]
    formato_simples: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductsResponse {
    pub sucesso: bool,
    pub produtos: Vec<Product>,
    pub total_produtos: usize,
}

impl ProductsResponse {
    pub(super) fn new(produtos: Vec<Product>) -> Self {
        Self {
            sucesso: true,
            total_produtos: produtos.len(),
            produtos,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategoriesResponse {
    pub sucesso: bool,
    pub categorias: BTreeMap<String, Vec<Product>>,
    pub total_categorias: usize,
    pub total_produtos: usize,
}

impl CategoriesResponse {
    pub(super) fn new(produtos: Vec<Product>) -> Self {
        let total_produtos = produtos.len();
        let mut categorias: BTreeMap<String, Vec<Product>> = BTreeMap::new();
        for product in produtos {
            let key = product
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UNCATEGORIZED.to_owned());
            categorias.entry(key).or_default().push(product);
        }
        Self {
            sucesso: true,
            total_categorias: categorias.len(),
            categorias,
            total_produtos,
        }
    }
}

async fn scrape(state: &AppState, params: &CredentialParams) -> Result<Vec<Product>, ApiError> {
    let session = BrowserSession::saborite(state, params).await?;
    let result =
        saborite::scrape_products(session.driver(), session.profile(), &state.config.timings).await;
    session.finish(result).await
}

pub(super) async fn list_catalog(
    State(state): State<AppState>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(ApiError::invalid_request)?;
    let params = CredentialParams {
        email: query.email,
        senha: query.senha,
    };

    let produtos = scrape(&state, &params).await?;
    Ok(if query.formato_simples {
        Json(ProductsResponse::new(produtos)).into_response()
    } else {
        Json(CategoriesResponse::new(produtos)).into_response()
    })
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<CredentialParams>, QueryRejection>,
) -> Result<Json<ProductsResponse>, ApiError> {
    let Query(params) = query.map_err(ApiError::invalid_request)?;
    let produtos = scrape(&state, &params).await?;
    Ok(Json(ProductsResponse::new(produtos)))
}

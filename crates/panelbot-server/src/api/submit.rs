//! Saborite order entry: `POST /api/envia-pedido`.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use panelbot_browser::{sites::saborite, CustomerChoice, NewCustomer, OrderRequest};
use panelbot_core::SubmissionOutcome;
use serde::{Deserialize, Serialize};

use super::{session::BrowserSession, ApiError, AppState, CredentialParams};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitOrderBody {
    email: Option<String>,
    senha: Option<String>,
    #[serde(default)]
    nome: String,
    #[serde(default)]
    telefone: String,
    #[serde(default)]
    cep: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    endereco: String,
    #[serde(default)]
    numero: String,
    #[serde(default)]
    complemento: String,
    /// Pick `nome` from the customer autocomplete instead of registering it.
    #[serde(default)]
    cliente_existente: bool,
    #[serde(default)]
    pagamento: String,
    id_produtos: Vec<String>,
}

impl SubmitOrderBody {
    fn into_parts(self) -> (CredentialParams, OrderRequest) {
        let customer = if self.cliente_existente {
            CustomerChoice::Existing { name: self.nome }
        } else {
            CustomerChoice::New(NewCustomer {
                nome: self.nome,
                telefone: self.telefone,
                cep: self.cep,
                bairro: self.bairro,
                endereco: self.endereco,
                numero: self.numero,
                complemento: self.complemento,
            })
        };
        let params = CredentialParams {
            email: self.email,
            senha: self.senha,
        };
        let request = OrderRequest {
            customer,
            product_ids: self.id_produtos.into_iter().map(|id| id.trim().to_owned()).collect(),
            payment: self.pagamento,
        };
        (params, request)
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SubmitResponse {
    pub sucesso: bool,
    pub mensagem: &'static str,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}

impl SubmitResponse {
    /// Rejected lines do not fail the order; they are listed instead.
    pub(super) fn new(outcome: SubmissionOutcome) -> Self {
        let mensagem = if outcome.is_complete() {
            "Pedido enviado com sucesso"
        } else {
            "Pedido enviado, mas alguns produtos não foram adicionados"
        };
        Self {
            sucesso: true,
            mensagem,
            outcome,
        }
    }
}

pub(super) async fn submit_order(
    State(state): State<AppState>,
    body: Result<Json<SubmitOrderBody>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::invalid_request(rejection.body_text()))?;
    let (params, request) = body.into_parts();
    request.validate()?;

    let session = BrowserSession::saborite(&state, &params).await?;
    let result = saborite::submit_order(
        session.driver(),
        session.profile(),
        &state.config.timings,
        &request,
    )
    .await;
    let outcome = session.finish(result).await?;

    tracing::info!(
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        "order submitted"
    );
    Ok(Json(SubmitResponse::new(outcome)))
}

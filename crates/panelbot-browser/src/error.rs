use chromiumoxide::error::CdpError;
use panelbot_core::{CredentialsMissing, ErrorKind, SiteKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("could not load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("devtools protocol error: {0}")]
    Cdp(#[from] CdpError),

    #[error("could not build devtools command: {0}")]
    Command(String),

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("timed out after {timeout_ms}ms waiting for {selector}")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("unexpected script result for {context}: {source}")]
    Script {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    CredentialsMissing(#[from] CredentialsMissing),

    #[error("login to {site} failed: authenticated marker never appeared")]
    LoginFailed { site: SiteKind },

    #[error("table not found: {selector}")]
    TableNotFound { selector: String },

    #[error("order {id} not found")]
    OrderNotFound { id: String },

    #[error("no menus found")]
    MenuNotFound,

    #[error("no customer suggestion matches '{name}'")]
    CustomerNotResolved { name: String },

    #[error("payment method '{method}' is not offered")]
    PaymentMethodInvalid { method: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{label} still unsatisfied after {attempts} attempts")]
    Exhausted { label: String, attempts: u32 },
}

impl BrowserError {
    /// Wire-level classification for API responses.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrowserError::Launch(_) | BrowserError::Navigation { .. } => ErrorKind::FalhaConexao,
            BrowserError::Timeout { .. } | BrowserError::Exhausted { .. } => ErrorKind::Timeout,
            BrowserError::CredentialsMissing(_) => ErrorKind::CredenciaisAusentes,
            BrowserError::LoginFailed { .. } => ErrorKind::FalhaLogin,
            BrowserError::TableNotFound { .. } => ErrorKind::TabelaNaoEncontrada,
            BrowserError::OrderNotFound { .. } => ErrorKind::PedidoNaoEncontrado,
            BrowserError::MenuNotFound => ErrorKind::MenuNaoEncontrado,
            BrowserError::CustomerNotResolved { .. } => ErrorKind::ClienteNaoEncontrado,
            BrowserError::PaymentMethodInvalid { .. } => ErrorKind::PagamentoInvalido,
            BrowserError::InvalidRequest(_) => ErrorKind::RequisicaoInvalida,
            BrowserError::Cdp(_)
            | BrowserError::Command(_)
            | BrowserError::ElementNotFound { .. }
            | BrowserError::Script { .. } => ErrorKind::Interno,
        }
    }
}

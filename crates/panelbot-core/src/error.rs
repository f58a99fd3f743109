use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Error classes exposed to API clients in the `tipo` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "ERR_CREDENCIAIS_AUSENTES")]
    CredenciaisAusentes,
    #[serde(rename = "ERR_REQUISICAO_INVALIDA")]
    RequisicaoInvalida,
    #[serde(rename = "ERR_FALHA_LOGIN")]
    FalhaLogin,
    #[serde(rename = "ERR_NAO_AUTORIZADO")]
    NaoAutorizado,
    #[serde(rename = "ERR_FALHA_CONEXAO")]
    FalhaConexao,
    #[serde(rename = "ERR_PEDIDO_NAO_ENCONTRADO")]
    PedidoNaoEncontrado,
    #[serde(rename = "ERR_TABELA_NAO_ENCONTRADA")]
    TabelaNaoEncontrada,
    #[serde(rename = "ERR_MENU_NAO_ENCONTRADO")]
    MenuNaoEncontrado,
    #[serde(rename = "ERR_CLIENTE_NAO_ENCONTRADO")]
    ClienteNaoEncontrado,
    #[serde(rename = "ERR_PAGAMENTO_INVALIDO")]
    PagamentoInvalido,
    #[serde(rename = "ERR_TIMEOUT")]
    Timeout,
    #[serde(rename = "ERR_INTERNO")]
    Interno,
}

impl ErrorKind {
    /// HTTP status code returned alongside this kind.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::CredenciaisAusentes | ErrorKind::RequisicaoInvalida => 400,
            ErrorKind::FalhaLogin | ErrorKind::NaoAutorizado => 401,
            ErrorKind::PedidoNaoEncontrado
            | ErrorKind::TabelaNaoEncontrada
            | ErrorKind::MenuNaoEncontrado => 404,
            ErrorKind::ClienteNaoEncontrado | ErrorKind::PagamentoInvalido => 422,
            ErrorKind::FalhaConexao => 502,
            ErrorKind::Timeout => 504,
            ErrorKind::Interno => 500,
        }
    }

    /// Short human-readable summary used in the `error` field.
    #[must_use]
    pub fn summary(self) -> &'static str {
        match self {
            ErrorKind::CredenciaisAusentes => "Credenciais ausentes",
            ErrorKind::RequisicaoInvalida => "Formato inválido",
            ErrorKind::FalhaLogin => "Falha no login",
            ErrorKind::NaoAutorizado => "Não autorizado",
            ErrorKind::FalhaConexao => "Erro ao iniciar o navegador",
            ErrorKind::PedidoNaoEncontrado => "Pedido não encontrado",
            ErrorKind::TabelaNaoEncontrada => "Tabela não encontrada",
            ErrorKind::MenuNaoEncontrado => "Menus não encontrados",
            ErrorKind::ClienteNaoEncontrado => "Cliente não encontrado",
            ErrorKind::PagamentoInvalido => "Forma de pagamento inválida",
            ErrorKind::Timeout => "Tempo de espera esgotado",
            ErrorKind::Interno => "Erro interno do servidor",
        }
    }
}

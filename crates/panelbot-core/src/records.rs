//! Records scraped from vendor admin tables and the transient bookkeeping
//! types that travel with them.
//!
//! Field names on the wire follow the Portuguese contract the API clients
//! already consume (`nome`, `preco`, `variacoes`, ...).

use serde::{Deserialize, Serialize};

/// One product row from the Saborite product list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: String,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "preco")]
    pub price: String,
    #[serde(rename = "ativo")]
    pub active: bool,
    #[serde(rename = "codigoBarras")]
    pub barcode: Option<String>,
    #[serde(rename = "imagem")]
    pub image: String,
    /// Empty when the edit modal could not be read for this product.
    #[serde(flatten)]
    pub detail: ProductDetail,
}

/// Variations and option groups read from a product's edit modal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    #[serde(rename = "variacoes")]
    pub variations: Vec<Variation>,
    #[serde(rename = "opcionais")]
    pub option_groups: Vec<OptionGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(rename = "descricao")]
    pub description: String,
    pub qtd_atacado: String,
    pub preco_atacado: String,
    pub preco_custo: String,
    #[serde(rename = "preco")]
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "obrigatorio")]
    pub required: bool,
    #[serde(rename = "descricao")]
    pub description: String,
}

/// One row from the Saborite customer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "bloqueado")]
    pub blocked: bool,
    #[serde(rename = "permitirRobo")]
    pub allow_bot: bool,
    #[serde(rename = "permitirCampanhas")]
    pub allow_campaigns: bool,
}

/// One row from the PlusDelivery order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "cliente")]
    pub customer: String,
    #[serde(rename = "dataHora")]
    pub placed_at: String,
    pub status: Option<String>,
    /// Inner markup of the order detail panel, or a placeholder message.
    #[serde(rename = "detalhes")]
    pub details: Option<String>,
}

/// One menu from the PlusDelivery menu table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRow {
    /// Zero-based row position; the menu table has no stable id column.
    #[serde(skip)]
    pub index: usize,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "disponivel")]
    pub available: bool,
    #[serde(rename = "produtos")]
    pub products: Vec<MenuProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuProduct {
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "valor")]
    pub price: String,
    #[serde(rename = "promocao")]
    pub promotion: String,
    #[serde(rename = "habilitado")]
    pub enabled: bool,
}

/// Pagination position for one table scrape.
///
/// `1 <= current <= total` always holds and `current` only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    current: u32,
    total: u32,
}

impl PageCursor {
    /// Starts on page 1. A total of zero is treated as a single page.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    #[must_use]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// The page after `current`, if any. Does not move the cursor.
    #[must_use]
    pub fn peek_next(&self) -> Option<u32> {
        (self.current < self.total).then_some(self.current + 1)
    }

    /// Moves to the next page and returns it, or `None` on the last page.
    pub fn advance(&mut self) -> Option<u32> {
        let next = self.peek_next()?;
        self.current = next;
        Some(next)
    }
}

/// Partition of requested order-line ids after an order-entry attempt.
///
/// Every requested id ends up in exactly one of the two lists; both keep
/// the order in which ids were first requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    #[serde(rename = "produtos_adicionados")]
    pub accepted: Vec<String>,
    #[serde(rename = "produtos_nao_adicionados")]
    pub rejected: Vec<String>,
}

impl SubmissionOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

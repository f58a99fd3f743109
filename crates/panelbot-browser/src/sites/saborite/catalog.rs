//! Saborite product list and the per-product edit modal.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use panelbot_core::{OptionGroup, Product, ProductDetail, Timings, Variation};
use regex::Regex;

use crate::detail::DetailView;
use crate::driver::{decode, js_literal, PageDriver, WaitState};
use crate::error::BrowserError;
use crate::table::{RawRow, RowMapper};

static QUOTED_ARG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'").expect("valid regex"));

const MODAL: &str = ".modal-content";
const MODAL_CLOSE: &str = r#"button.btn-secondary[onclick="cancelar()"]"#;
const VARIATIONS_TAB: &str = r##"a[href="#variacoesTab"]"##;
const OPTIONS_TAB: &str = r##"a[href="#opcionaisTab"]"##;
const MODAL_LOAD_SETTLE: Duration = Duration::from_millis(500);
const TAB_SETTLE: Duration = Duration::from_millis(300);

/// Up to five price slots; slot 1 has no numeric suffix. A first slot with a
/// price but no description is the product's default size.
const VARIATIONS_JS: &str = r#"(() => {
  const val = name => { const el = document.querySelector(`input[name="${name}"]`); return el ? el.value : ''; };
  const out = [];
  for (let i = 1; i <= 5; i++) {
    const s = i === 1 ? '' : String(i);
    const descricao = val('tamanho' + s).trim();
    const preco = val('preco' + s);
    const rest = {
      qtd_atacado: val('qtd_atacado' + s),
      preco_atacado: val('preco_atacado' + s),
      preco_custo: val('preco_custo' + s),
      preco,
    };
    if (descricao) out.push({ descricao, ...rest });
    else if (i === 1 && preco.trim()) out.push({ descricao: 'Padrão', ...rest });
  }
  return out;
})()"#;

/// Checked add-on groups, named by the label's own text nodes only.
const OPTION_GROUPS_JS: &str = r#"(() => Array.from(document.querySelectorAll('input[name="adicionais[]"]:checked')).flatMap(box => {
  const label = document.querySelector(`label[for="adc${box.value}"]`);
  if (!label) return [];
  const nome = Array.from(label.childNodes)
    .filter(n => n.nodeType === Node.TEXT_NODE)
    .map(n => n.textContent.trim())
    .join('')
    .trim();
  const small = label.querySelector('p.small.text-muted');
  return [{
    id: box.value,
    nome,
    obrigatorio: !!label.querySelector('.badge-primary'),
    descricao: small ? small.textContent.trim() : '',
  }];
}))()"#;

/// First single-quoted argument of a `getCodigoBarras('...')` handler.
pub(crate) fn parse_barcode(onclick: &str) -> Option<String> {
    QUOTED_ARG_RE
        .captures(onclick)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Resolves an image `src` against the site's base URL.
pub(crate) fn absolutize(base_url: &str, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_owned()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{rest}")
    } else if src.starts_with('/') {
        format!("{base_url}{src}")
    } else {
        format!("{base_url}/{src}")
    }
}

/// Product rows: id, name block (name, note, image), price, status toggle,
/// action buttons.
pub struct ProductMapper {
    base_url: String,
}

impl ProductMapper {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
        }
    }
}

impl RowMapper for ProductMapper {
    type Record = Product;

    fn map(&self, row: &RawRow) -> Option<Product> {
        let id = row.cells.first()?.text.clone();
        let name_cell = row.cells.get(1)?;
        let name = name_cell.lead.clone()?;

        let barcode = row.cells.get(4).and_then(|cell| {
            cell.actions
                .iter()
                .find(|action| action.contains("getCodigoBarras"))
                .and_then(|action| parse_barcode(action))
        });

        let image = name_cell
            .image
            .as_deref()
            .filter(|src| !src.is_empty())
            .map(|src| absolutize(&self.base_url, src))
            .unwrap_or_default();

        Some(Product {
            id,
            category: row.group.clone(),
            name,
            description: name_cell.note.clone(),
            price: row.cells.get(2).map(|c| c.hidden.clone()).unwrap_or_default(),
            active: row.cells.get(3).and_then(|c| c.checked).unwrap_or(false),
            barcode,
            image,
            detail: ProductDetail::default(),
        })
    }
}

/// The edit modal opened from a product row's `setProduto` button.
pub struct ProductModal<'a> {
    driver: &'a dyn PageDriver,
    element_timeout: Duration,
}

impl<'a> ProductModal<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, timings: &Timings) -> Self {
        Self {
            driver,
            element_timeout: timings.element_timeout(),
        }
    }

    fn edit_button(product_id: &str) -> String {
        format!(r#"button[onclick*="setProduto({{id: {product_id}}});"]"#)
    }

    async fn activate_tab(&self, tab: &str) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const tab = document.querySelector({}); \
             if (tab && !tab.classList.contains('active')) {{ tab.click(); return true; }} return false; }})()",
            js_literal(tab)
        );
        if self.driver.evaluate(&script).await?.as_bool().unwrap_or(false) {
            self.driver.settle(TAB_SETTLE).await;
        }
        Ok(())
    }
}

#[async_trait]
impl DetailView<Product> for ProductModal<'_> {
    type Detail = ProductDetail;

    fn describe(&self, record: &Product) -> String {
        format!("{} ({})", record.id, record.name)
    }

    async fn available(&self, record: &Product) -> Result<bool, BrowserError> {
        self.driver.exists(&Self::edit_button(&record.id)).await
    }

    async fn open(&self, record: &Product) -> Result<(), BrowserError> {
        self.driver.click(&Self::edit_button(&record.id)).await?;
        self.driver
            .wait_for(MODAL, WaitState::Visible, self.element_timeout)
            .await?;
        self.driver.settle(MODAL_LOAD_SETTLE).await;
        Ok(())
    }

    async fn extract(&self, _record: &Product) -> Result<ProductDetail, BrowserError> {
        self.activate_tab(VARIATIONS_TAB).await?;
        let variations: Vec<Variation> =
            decode(self.driver.evaluate(VARIATIONS_JS).await?, "product variations")?;

        self.activate_tab(OPTIONS_TAB).await?;
        let option_groups: Vec<OptionGroup> =
            decode(self.driver.evaluate(OPTION_GROUPS_JS).await?, "product option groups")?;

        Ok(ProductDetail {
            variations,
            option_groups,
        })
    }

    async fn close(&self, _record: &Product) -> Result<(), BrowserError> {
        if !self.driver.exists(MODAL_CLOSE).await? {
            return Ok(());
        }
        self.driver.click(MODAL_CLOSE).await?;
        self.driver
            .wait_for(MODAL, WaitState::Hidden, self.element_timeout)
            .await?;
        self.driver.settle(TAB_SETTLE).await;
        Ok(())
    }
}

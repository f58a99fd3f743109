//! Menus and their products, served from an embedded webservice frame.

use std::time::Duration;

use async_trait::async_trait;
use panelbot_core::{MenuProduct, MenuRow, SiteKind, Timings};
use serde::Deserialize;

use crate::detail::{expand_details, DetailView};
use crate::driver::{decode, js_literal, PageDriver, WaitState};
use crate::error::BrowserError;
use crate::retry::{retry_until, RetryPolicy};

const MENU_BUTTON: &str = "a#cardapio_button";
const MENU_FRAME: &str = r#"iframe[src*="webservice.plusdelivery.com.br"]"#;
const MENU_ROWS: &str = "table#menus tr";
const MENU_CONTENT: &str = ".content";
const MENU_OPEN_SETTLE: Duration = Duration::from_secs(3);
const MENU_ROW_SETTLE: Duration = Duration::from_millis(500);

const MENU_PRODUCTS_JS: &str = r#"Array.from(document.querySelectorAll('table#produtos tr')).map(row => {
  const text = (sel, fallback) => { const el = row.querySelector(sel); return el ? el.textContent.trim() : fallback; };
  const toggle = row.querySelector('.habilitado input');
  return {
    id: text('.id', 'ID não encontrado'),
    nome: text('.nome', 'Nome não encontrado'),
    valor: text('.valor div', 'Valor não encontrado'),
    promocao: text('.promocao div div', 'Promoção não encontrada'),
    habilitado: toggle ? toggle.checked : false,
  };
})"#;

#[derive(Debug, Deserialize)]
struct MenuSnapshot {
    index: usize,
    nome: String,
    disponivel: bool,
}

/// Frame `src` values may be protocol-relative.
fn frame_url(src: &str) -> String {
    match src.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => src.to_owned(),
    }
}

async fn frame_src(driver: &dyn PageDriver, timeout: Duration) -> Result<Option<String>, BrowserError> {
    match driver.wait_for(MENU_FRAME, WaitState::Attached, timeout).await {
        Ok(()) => {}
        Err(BrowserError::Timeout { .. }) => return Ok(None),
        Err(err) => return Err(err),
    }
    let script = format!(
        "(() => {{ const f = document.querySelector({}); return f ? f.getAttribute('src') : null; }})()",
        js_literal(MENU_FRAME)
    );
    let src: Option<String> = decode(driver.evaluate(&script).await?, "menu frame src")?;
    Ok(src.filter(|s| !s.trim().is_empty()))
}

/// Locates the menu frame, reloading the dashboard between attempts.
async fn discover_frame(driver: &dyn PageDriver, timings: &Timings) -> Result<String, BrowserError> {
    let policy = RetryPolicy::new(timings.frame_attempts, timings.retry_backoff());
    let timeout = timings.frame_timeout();
    let src = retry_until(
        policy,
        "menu frame",
        || frame_src(driver, timeout),
        || async move {
            driver.reload().await?;
            driver.settle(MENU_OPEN_SETTLE).await;
            if driver.exists(MENU_BUTTON).await? {
                driver.click(MENU_BUTTON).await?;
            }
            Ok(())
        },
        Option::is_some,
    )
    .await?;
    src.map(|s| frame_url(&s)).ok_or_else(|| BrowserError::Exhausted {
        label: "menu frame".to_owned(),
        attempts: policy.max_attempts,
    })
}

/// A menu's product table, opened by clicking its row.
pub struct MenuProducts<'a> {
    driver: &'a dyn PageDriver,
    element_timeout: Duration,
}

impl<'a> MenuProducts<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, timings: &Timings) -> Self {
        Self {
            driver,
            element_timeout: timings.element_timeout(),
        }
    }
}

#[async_trait]
impl DetailView<MenuRow> for MenuProducts<'_> {
    type Detail = Vec<MenuProduct>;

    fn describe(&self, record: &MenuRow) -> String {
        record.name.clone()
    }

    async fn available(&self, record: &MenuRow) -> Result<bool, BrowserError> {
        Ok(record.available)
    }

    async fn open(&self, record: &MenuRow) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const row = document.querySelectorAll({})[{}]; if (!row) return false; row.click(); return true; }})()",
            js_literal(MENU_ROWS),
            record.index
        );
        if !self.driver.evaluate(&script).await?.as_bool().unwrap_or(false) {
            return Err(BrowserError::ElementNotFound {
                selector: format!("{MENU_ROWS}[{}]", record.index),
            });
        }
        self.driver.settle(MENU_ROW_SETTLE).await;
        self.driver
            .wait_for(MENU_CONTENT, WaitState::Visible, self.element_timeout)
            .await
    }

    async fn extract(&self, _record: &MenuRow) -> Result<Vec<MenuProduct>, BrowserError> {
        decode(self.driver.evaluate(MENU_PRODUCTS_JS).await?, "menu products")
    }
}

/// Every menu with its products; unavailable menus keep an empty list.
///
/// # Errors
///
/// - [`BrowserError::LoginFailed`] when the dashboard has no menu button.
/// - A timeout kind when the frame never appears.
/// - [`BrowserError::MenuNotFound`] when the frame lists no menus.
pub async fn list_menus(driver: &dyn PageDriver, timings: &Timings) -> Result<Vec<MenuRow>, BrowserError> {
    match driver
        .wait_for(MENU_BUTTON, WaitState::Attached, timings.element_timeout())
        .await
    {
        Ok(()) => {}
        Err(BrowserError::Timeout { .. }) => {
            return Err(BrowserError::LoginFailed {
                site: SiteKind::PlusDelivery,
            })
        }
        Err(err) => return Err(err),
    }
    driver.click(MENU_BUTTON).await?;
    driver.settle(MENU_OPEN_SETTLE).await;

    let url = discover_frame(driver, timings).await?;
    tracing::info!(%url, "menu frame found, loading its document");
    driver.goto(&url).await?;

    match driver
        .wait_for(MENU_ROWS, WaitState::Attached, timings.frame_timeout())
        .await
    {
        Ok(()) => {}
        Err(BrowserError::Timeout { .. }) => return Err(BrowserError::MenuNotFound),
        Err(err) => return Err(err),
    }

    let script = format!(
        "Array.from(document.querySelectorAll({})).map((row, index) => {{ \
         const nome = row.querySelector('td.nome'); \
         return {{ index, nome: nome ? nome.textContent.trim() : 'Menu Sem Nome', \
         disponivel: !row.querySelector('.indisponivel') }}; }})",
        js_literal(MENU_ROWS)
    );
    let snapshots: Vec<MenuSnapshot> = decode(driver.evaluate(&script).await?, "menu rows")?;
    if snapshots.is_empty() {
        return Err(BrowserError::MenuNotFound);
    }
    tracing::info!(menus = snapshots.len(), "menu rows read");

    let menus: Vec<MenuRow> = snapshots
        .into_iter()
        .map(|snap| MenuRow {
            index: snap.index,
            name: snap.nome,
            available: snap.disponivel,
            products: Vec::new(),
        })
        .collect();

    let view = MenuProducts::new(driver, timings);
    Ok(expand_details(&view, menus)
        .await
        .into_iter()
        .map(|expanded| {
            let mut menu = expanded.record;
            menu.products = expanded.detail.into_extracted().unwrap_or_default();
            menu
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePage;
    use serde_json::json;

    fn fast_timings(frame_attempts: u32) -> Timings {
        Timings {
            frame_attempts,
            retry_backoff_ms: 0,
            ..Timings::default()
        }
    }

    #[test]
    fn protocol_relative_frame_src_gets_https() {
        assert_eq!(
            frame_url("//webservice.plusdelivery.com.br/cardapio/1"),
            "https://webservice.plusdelivery.com.br/cardapio/1"
        );
        assert_eq!(frame_url("https://a.example/x"), "https://a.example/x");
    }

    #[tokio::test]
    async fn missing_menu_button_means_login_failed() {
        let page = FakePage::default();
        let err = list_menus(&page, &fast_timings(3)).await.unwrap_err();
        assert!(matches!(err, BrowserError::LoginFailed { site: SiteKind::PlusDelivery }));
    }

    #[tokio::test]
    async fn frame_discovery_gives_up_after_policy_attempts() {
        let page = FakePage::with_present(&[MENU_BUTTON]);
        let err = list_menus(&page, &fast_timings(2)).await.unwrap_err();

        assert_eq!(err.kind(), panelbot_core::ErrorKind::Timeout);
        let reloads = page.calls().iter().filter(|c| *c == "reload").count();
        assert_eq!(reloads, 1);
    }

    #[tokio::test]
    async fn reads_available_menus_and_skips_unavailable() {
        let page = FakePage::with_present(&[MENU_BUTTON, MENU_FRAME, MENU_ROWS, MENU_CONTENT]);
        page.push_evaluation(json!("//webservice.plusdelivery.com.br/menus?loja=9"));
        page.push_evaluation(json!([
            { "index": 0, "nome": "Almoço", "disponivel": true },
            { "index": 1, "nome": "Madrugada", "disponivel": false }
        ]));
        page.push_evaluation(json!(true));
        page.push_evaluation(json!([
            { "id": "11", "nome": "Feijoada", "valor": "R$ 39,90", "promocao": "Promoção não encontrada", "habilitado": true }
        ]));

        let menus = list_menus(&page, &fast_timings(3)).await.unwrap();

        assert!(page
            .calls()
            .contains(&"goto https://webservice.plusdelivery.com.br/menus?loja=9".to_owned()));
        assert_eq!(menus.len(), 2);
        assert_eq!(menus[0].products.len(), 1);
        assert_eq!(menus[0].products[0].name, "Feijoada");
        assert!(!menus[1].available);
        assert!(menus[1].products.is_empty());
    }

    #[tokio::test]
    async fn empty_menu_table_is_not_found() {
        let page = FakePage::with_present(&[MENU_BUTTON, MENU_FRAME, MENU_ROWS]);
        page.push_evaluation(json!("https://webservice.plusdelivery.com.br/m"));
        page.push_evaluation(json!([]));

        let err = list_menus(&page, &fast_timings(3)).await.unwrap_err();
        assert!(matches!(err, BrowserError::MenuNotFound));
    }
}

//! The Saborite point-of-sale screen as an [`OrderForm`].

use std::time::Duration;

use async_trait::async_trait;
use panelbot_core::{SessionProfile, Timings};
use serde::Deserialize;

use crate::driver::{decode, js_literal, Modifiers, PageDriver, WaitState};
use crate::error::BrowserError;
use crate::order::{NewCustomer, OrderForm, PaymentOption};

const PDV_PATH: &str = "/adm/pdv/index/";
const ADD_CUSTOMER: &str = r#"a[href="javascript:addUsuario();"]"#;
const CUSTOMER_FORM: &str = "#form-usuario";
const SAVE_CUSTOMER: &str = r#"button[class="btn btn-primary"]"#;
const CUSTOMER_SEARCH: &str = r#"input[name="cliente"]"#;
const CUSTOMER_SUGGESTIONS: &str = "ul.ui-autocomplete li.ui-menu-item";
const PRODUCT_PROMPT: &str = "span.input-group-text";
const PROMPT_INPUT: &str = "input.swal2-input";
const PROMPT_CONFIRM: &str = "button.swal2-confirm";
const PAYMENT_SELECT: &str = r#"select[name="pagamento"]"#;
const LINE_ROWS: &str = "#tabela-pedido tbody tr";
const LINE_REMOVE: &str = r#"[onclick*="remover"]"#;

const STEP_SETTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct OptionSnapshot {
    value: String,
    label: String,
}

pub struct SaboritePdv<'a> {
    driver: &'a dyn PageDriver,
    url: String,
    element_timeout: Duration,
    order_settle: Duration,
}

impl<'a> SaboritePdv<'a> {
    #[must_use]
    pub fn new(driver: &'a dyn PageDriver, profile: &SessionProfile, timings: &Timings) -> Self {
        Self {
            driver,
            url: profile.url(PDV_PATH),
            element_timeout: timings.element_timeout(),
            order_settle: timings.order_settle(),
        }
    }

    async fn visible(&self, selector: &str) -> Result<(), BrowserError> {
        self.driver
            .wait_for(selector, WaitState::Visible, self.element_timeout)
            .await
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<bool, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelectorAll({})[{index}]; if (!el) return false; el.click(); return true; }})()",
            js_literal(selector)
        );
        Ok(self.driver.evaluate(&script).await?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl OrderForm for SaboritePdv<'_> {
    async fn open(&self) -> Result<(), BrowserError> {
        tracing::info!(url = %self.url, "opening point of sale");
        self.driver.goto(&self.url).await?;
        self.driver
            .wait_for(PRODUCT_PROMPT, WaitState::Attached, self.element_timeout)
            .await
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<(), BrowserError> {
        self.driver.click(ADD_CUSTOMER).await?;
        self.visible(CUSTOMER_FORM).await?;

        let field = |name: &str| format!(r#"{CUSTOMER_FORM} input[name="{name}"]"#);
        self.driver.fill(&field("nome"), &customer.nome).await?;
        self.driver.fill(&field("tel"), &customer.telefone).await?;
        self.driver.fill(&field("cep"), &customer.cep).await?;

        let bairro = format!(r#"{CUSTOMER_FORM} select[name="bairro"]"#);
        if !self.driver.select_option(&bairro, &customer.bairro).await? {
            return Err(BrowserError::InvalidRequest(format!(
                "bairro '{}' is not offered",
                customer.bairro
            )));
        }

        self.driver.fill(&field("end"), &customer.endereco).await?;
        self.driver.fill(&field("nm"), &customer.numero).await?;
        self.driver
            .fill(&field("complemento"), &customer.complemento)
            .await?;

        self.driver.click(SAVE_CUSTOMER).await?;
        self.driver.settle(STEP_SETTLE).await;
        Ok(())
    }

    async fn customer_suggestions(&self, name: &str) -> Result<Vec<String>, BrowserError> {
        self.driver.type_into(CUSTOMER_SEARCH, name).await?;
        match self.visible(CUSTOMER_SUGGESTIONS).await {
            Ok(()) => {}
            Err(BrowserError::Timeout { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        }
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(li => li.textContent.trim())",
            js_literal(CUSTOMER_SUGGESTIONS)
        );
        decode(self.driver.evaluate(&script).await?, "customer suggestions")
    }

    async fn pick_suggestion(&self, index: usize) -> Result<(), BrowserError> {
        if self.click_nth(CUSTOMER_SUGGESTIONS, index).await? {
            self.driver.settle(STEP_SETTLE).await;
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: format!("{CUSTOMER_SUGGESTIONS}[{index}]"),
            })
        }
    }

    async fn add_line(&self, product_id: &str) -> Result<(), BrowserError> {
        tracing::debug!(product_id, "adding order line");
        self.driver.click(PRODUCT_PROMPT).await?;
        self.visible(PROMPT_INPUT).await?;
        self.driver.type_into(PROMPT_INPUT, product_id).await?;

        // The prompt asks for the id, then for confirmation of the product found.
        self.driver.click(PROMPT_CONFIRM).await?;
        self.driver.settle(STEP_SETTLE).await;
        self.visible(PROMPT_CONFIRM).await?;
        self.driver.click(PROMPT_CONFIRM).await?;
        self.driver.settle(STEP_SETTLE).await;
        Ok(())
    }

    async fn line_ids(&self) -> Result<Vec<String>, BrowserError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(row => \
             (row.getAttribute('data-id') || ((row.querySelector('td') || {{}}).textContent) || '').trim())\
             .filter(id => id)",
            js_literal(LINE_ROWS)
        );
        decode(self.driver.evaluate(&script).await?, "order lines")
    }

    async fn remove_line(&self, product_id: &str) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const row = Array.from(document.querySelectorAll({rows})).find(row => \
             (row.getAttribute('data-id') || ((row.querySelector('td') || {{}}).textContent) || '').trim() === {id}); \
             const btn = row && row.querySelector({remove}); if (!btn) return false; btn.click(); return true; }})()",
            rows = js_literal(LINE_ROWS),
            id = js_literal(product_id),
            remove = js_literal(LINE_REMOVE),
        );
        if self.driver.evaluate(&script).await?.as_bool().unwrap_or(false) {
            self.driver.settle(STEP_SETTLE).await;
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: format!("{LINE_ROWS} {LINE_REMOVE}"),
            })
        }
    }

    async fn payment_options(&self) -> Result<Vec<PaymentOption>, BrowserError> {
        let script = format!(
            "(() => {{ const sel = document.querySelector({}); if (!sel) return []; \
             return Array.from(sel.options).filter(o => o.value !== '') \
             .map(o => ({{ value: o.value, label: o.text.trim() }})); }})()",
            js_literal(PAYMENT_SELECT)
        );
        let options: Vec<OptionSnapshot> =
            decode(self.driver.evaluate(&script).await?, "payment options")?;
        Ok(options
            .into_iter()
            .map(|o| PaymentOption {
                value: o.value,
                label: o.label,
            })
            .collect())
    }

    async fn select_payment(&self, option: &PaymentOption) -> Result<(), BrowserError> {
        if self.driver.select_option(PAYMENT_SELECT, &option.value).await? {
            Ok(())
        } else {
            Err(BrowserError::PaymentMethodInvalid {
                method: option.value.clone(),
            })
        }
    }

    async fn finalize(&self) -> Result<(), BrowserError> {
        tracing::info!("finalizing order (Shift+F)");
        self.driver.press_key("F", Modifiers::SHIFT).await?;
        self.driver.settle(self.order_settle).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakePage;

    fn pdv(page: &FakePage) -> SaboritePdv<'_> {
        SaboritePdv::new(
            page,
            &SessionProfile::saborite("https://s.example.com"),
            &Timings::default(),
        )
    }

    #[tokio::test]
    async fn open_navigates_to_point_of_sale() {
        let page = FakePage::with_present(&[PRODUCT_PROMPT]);
        pdv(&page).open().await.unwrap();
        assert_eq!(page.calls()[0], "goto https://s.example.com/adm/pdv/index/");
    }

    #[tokio::test]
    async fn new_customer_fills_every_field_in_order() {
        let page = FakePage::with_present(&[CUSTOMER_FORM]);
        let customer = NewCustomer {
            nome: "Maria".to_owned(),
            telefone: "11999990000".to_owned(),
            cep: "01001000".to_owned(),
            bairro: "Centro".to_owned(),
            endereco: "Praça da Sé".to_owned(),
            numero: "1".to_owned(),
            complemento: String::new(),
        };
        pdv(&page).create_customer(&customer).await.unwrap();

        let fills: Vec<String> = page
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("fill") || c.starts_with("select"))
            .collect();
        assert_eq!(fills.len(), 7);
        assert!(fills[0].contains(r#"input[name="nome"] Maria"#));
        assert!(fills[3].starts_with("select"));
        assert!(fills[3].ends_with("Centro"));
        assert_eq!(
            page.calls().last().map(String::as_str),
            Some(r#"click button[class="btn btn-primary"]"#)
        );
    }

    #[tokio::test]
    async fn add_line_confirms_prompt_twice() {
        let page = FakePage::with_present(&[PROMPT_INPUT, PROMPT_CONFIRM]);
        pdv(&page).add_line("15").await.unwrap();
        let calls = page.calls();
        assert!(calls.contains(&"type input.swal2-input 15".to_owned()));
        let confirms = calls
            .iter()
            .filter(|c| *c == "click button.swal2-confirm")
            .count();
        assert_eq!(confirms, 2);
    }

    #[tokio::test]
    async fn finalize_sends_shift_f() {
        let page = FakePage::default();
        pdv(&page).finalize().await.unwrap();
        assert_eq!(page.calls(), vec!["key F 8".to_owned()]);
    }

    #[tokio::test]
    async fn suggestions_empty_when_autocomplete_never_opens() {
        let page = FakePage::default();
        let suggestions = pdv(&page).customer_suggestions("Ana").await.unwrap();
        assert!(suggestions.is_empty());
    }

    #[tokio::test]
    async fn payment_options_are_decoded() {
        let page = FakePage::default();
        page.push_evaluation(serde_json::json!([
            { "value": "1", "label": "Dinheiro" },
            { "value": "2", "label": "Cartão" }
        ]));
        let options = pdv(&page).payment_options().await.unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].label, "Cartão");
    }
}

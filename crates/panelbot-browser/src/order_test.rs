use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::*;

#[derive(Default)]
struct FakeForm {
    lines: Mutex<Vec<String>>,
    /// Remaining silent failures per product id: the add "succeeds" but no
    /// line shows up.
    flaky: Mutex<HashMap<String, u32>>,
    /// Ids whose added line only shows up one `line_ids` read later.
    lagging: Vec<String>,
    rendering: Mutex<Vec<String>>,
    suggestions: Vec<String>,
    payments: Vec<PaymentOption>,
    log: Mutex<Vec<String>>,
}

impl FakeForm {
    fn new() -> Self {
        Self {
            payments: vec![
                PaymentOption {
                    value: "1".to_owned(),
                    label: "Dinheiro".to_owned(),
                },
                PaymentOption {
                    value: "pix".to_owned(),
                    label: "PIX".to_owned(),
                },
            ],
            ..Self::default()
        }
    }

    fn flaky(self, id: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(id.to_owned(), failures);
        self
    }

    fn lagging(mut self, id: &str) -> Self {
        self.lagging.push(id.to_owned());
        self
    }

    fn log(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderForm for FakeForm {
    async fn open(&self) -> Result<(), BrowserError> {
        self.log("open");
        Ok(())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<(), BrowserError> {
        self.log(format!("create {}", customer.nome));
        Ok(())
    }

    async fn customer_suggestions(&self, _name: &str) -> Result<Vec<String>, BrowserError> {
        Ok(self.suggestions.clone())
    }

    async fn pick_suggestion(&self, index: usize) -> Result<(), BrowserError> {
        self.log(format!("pick {index}"));
        Ok(())
    }

    async fn add_line(&self, product_id: &str) -> Result<(), BrowserError> {
        let mut flaky = self.flaky.lock().unwrap();
        if let Some(remaining) = flaky.get_mut(product_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(());
            }
        }
        self.log(format!("add {product_id}"));
        if self.lagging.iter().any(|id| id == product_id) {
            self.rendering.lock().unwrap().push(product_id.to_owned());
        } else {
            self.lines.lock().unwrap().push(product_id.to_owned());
        }
        Ok(())
    }

    async fn line_ids(&self) -> Result<Vec<String>, BrowserError> {
        let mut lines = self.lines.lock().unwrap();
        let snapshot = lines.clone();
        lines.append(&mut self.rendering.lock().unwrap());
        Ok(snapshot)
    }

    async fn remove_line(&self, product_id: &str) -> Result<(), BrowserError> {
        self.log(format!("remove {product_id}"));
        let mut lines = self.lines.lock().unwrap();
        if let Some(pos) = lines.iter().position(|line| line == product_id) {
            lines.remove(pos);
        }
        Ok(())
    }

    async fn payment_options(&self) -> Result<Vec<PaymentOption>, BrowserError> {
        Ok(self.payments.clone())
    }

    async fn select_payment(&self, option: &PaymentOption) -> Result<(), BrowserError> {
        self.log(format!("pay {}", option.value));
        Ok(())
    }

    async fn finalize(&self) -> Result<(), BrowserError> {
        self.log("finalize");
        Ok(())
    }
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_owned()).collect()
}

fn new_customer_order(product_ids: &[&str], payment: &str) -> OrderRequest {
    OrderRequest {
        customer: CustomerChoice::New(NewCustomer {
            nome: "Maria".to_owned(),
            telefone: "11999990000".to_owned(),
            bairro: "Centro".to_owned(),
            ..NewCustomer::default()
        }),
        product_ids: ids(product_ids),
        payment: payment.to_owned(),
    }
}

fn two_passes() -> RetryPolicy {
    RetryPolicy::new(2, Duration::ZERO)
}

#[tokio::test]
async fn line_failing_both_passes_is_rejected_but_order_finalizes() {
    let form = FakeForm::new().flaky("B", 2);
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "B", "C"], "pix"))
        .await
        .unwrap();

    assert_eq!(outcome.accepted, ids(&["A", "C"]));
    assert_eq!(outcome.rejected, ids(&["B"]));
    assert_eq!(sequencer.stage(), OrderStage::Finalized);
    assert_eq!(form.entries().last().map(String::as_str), Some("finalize"));
}

#[tokio::test]
async fn line_recovering_on_second_pass_is_accepted() {
    let form = FakeForm::new().flaky("B", 1);
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "B"], "Dinheiro"))
        .await
        .unwrap();

    assert_eq!(outcome.accepted, ids(&["A", "B"]));
    assert!(outcome.rejected.is_empty());
    assert!(form.entries().contains(&"pay 1".to_owned()));
}

#[tokio::test]
async fn stale_lines_are_removed() {
    let form = FakeForm::new();
    form.lines.lock().unwrap().push("OLD".to_owned());
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    sequencer
        .submit(&new_customer_order(&["A"], "pix"))
        .await
        .unwrap();

    assert!(form.entries().contains(&"remove OLD".to_owned()));
    assert_eq!(*form.lines.lock().unwrap(), ids(&["A"]));
}

#[tokio::test]
async fn duplicate_ids_add_repeated_lines_and_collapse_in_outcome() {
    let form = FakeForm::new();
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "A"], "pix"))
        .await
        .unwrap();

    assert_eq!(*form.lines.lock().unwrap(), ids(&["A", "A"]));
    assert_eq!(outcome.accepted, ids(&["A"]));
}

#[tokio::test]
async fn late_rendered_line_is_not_added_twice() {
    let form = FakeForm::new().lagging("B");
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "B"], "pix"))
        .await
        .unwrap();

    assert_eq!(*form.lines.lock().unwrap(), ids(&["A", "B"]));
    assert_eq!(outcome.accepted, ids(&["A", "B"]));
    assert!(outcome.rejected.is_empty());
    let adds = form.entries().iter().filter(|e| *e == "add B").count();
    assert_eq!(adds, 1);
}

#[tokio::test]
async fn surplus_copies_are_trimmed_to_requested_count() {
    let form = FakeForm::new();
    form.lines.lock().unwrap().extend(ids(&["B", "B"]));
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "B"], "pix"))
        .await
        .unwrap();

    assert_eq!(*form.lines.lock().unwrap(), ids(&["B", "A"]));
    assert_eq!(outcome.accepted, ids(&["A", "B"]));
    assert!(!form.entries().contains(&"add B".to_owned()));
}

#[tokio::test]
async fn duplicate_missing_its_second_copy_is_rejected() {
    let form = FakeForm::new().flaky("A", 2);
    form.lines.lock().unwrap().push("A".to_owned());
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let outcome = sequencer
        .submit(&new_customer_order(&["A", "A"], "pix"))
        .await
        .unwrap();

    assert!(outcome.accepted.is_empty());
    assert_eq!(outcome.rejected, ids(&["A"]));
}

#[tokio::test]
async fn unknown_payment_fails_and_never_finalizes() {
    let form = FakeForm::new();
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let err = sequencer
        .submit(&new_customer_order(&["A"], "cheque"))
        .await
        .unwrap_err();

    assert!(matches!(err, BrowserError::PaymentMethodInvalid { ref method } if method == "cheque"));
    assert_eq!(sequencer.stage(), OrderStage::Failed);
    assert!(!form.entries().contains(&"finalize".to_owned()));
}

#[tokio::test]
async fn existing_customer_picks_first_matching_suggestion() {
    let form = FakeForm {
        suggestions: ids(&["João Silva", "Maria Souza - 1199", "maria souza (2)"]),
        ..FakeForm::new()
    };
    let mut sequencer = OrderSequencer::new(&form, two_passes());
    let request = OrderRequest {
        customer: CustomerChoice::Existing {
            name: "MARIA souza".to_owned(),
        },
        product_ids: ids(&["A"]),
        payment: "pix".to_owned(),
    };

    sequencer.submit(&request).await.unwrap();
    assert!(form.entries().contains(&"pick 1".to_owned()));
}

#[tokio::test]
async fn existing_customer_without_match_fails() {
    let form = FakeForm {
        suggestions: ids(&["João Silva"]),
        ..FakeForm::new()
    };
    let mut sequencer = OrderSequencer::new(&form, two_passes());
    let request = OrderRequest {
        customer: CustomerChoice::Existing {
            name: "Ana".to_owned(),
        },
        product_ids: ids(&["A"]),
        payment: "pix".to_owned(),
    };

    let err = sequencer.submit(&request).await.unwrap_err();
    assert!(matches!(err, BrowserError::CustomerNotResolved { .. }));
    assert!(form.lines.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sequencer_cannot_be_reused() {
    let form = FakeForm::new();
    let mut sequencer = OrderSequencer::new(&form, two_passes());
    sequencer
        .submit(&new_customer_order(&["A"], "pix"))
        .await
        .unwrap();
    let err = sequencer
        .submit(&new_customer_order(&["A"], "pix"))
        .await
        .unwrap_err();
    assert!(matches!(err, BrowserError::InvalidRequest(_)));
}

#[test]
fn validation_rejects_blank_fields() {
    assert!(new_customer_order(&["A"], "pix").validate().is_ok());
    assert!(new_customer_order(&["A", " "], "pix").validate().is_err());
    assert!(new_customer_order(&["A"], "").validate().is_err());
}

#[test]
fn validation_requires_products_and_a_bairro_for_new_customers() {
    let empty = new_customer_order(&[], "pix").validate().unwrap_err();
    assert!(matches!(empty, BrowserError::InvalidRequest(ref msg) if msg.contains("id_produtos")));

    let mut request = new_customer_order(&["A"], "pix");
    if let CustomerChoice::New(customer) = &mut request.customer {
        customer.bairro = "  ".to_owned();
    }
    let err = request.validate().unwrap_err();
    assert!(matches!(err, BrowserError::InvalidRequest(ref msg) if msg.contains("bairro")));

    let existing = OrderRequest {
        customer: CustomerChoice::Existing {
            name: "Ana".to_owned(),
        },
        product_ids: ids(&["A"]),
        payment: "pix".to_owned(),
    };
    assert!(existing.validate().is_ok());
}

#[tokio::test]
async fn empty_order_never_opens_the_form() {
    let form = FakeForm::new();
    let mut sequencer = OrderSequencer::new(&form, two_passes());

    let err = sequencer
        .submit(&new_customer_order(&[], "pix"))
        .await
        .unwrap_err();

    assert!(matches!(err, BrowserError::InvalidRequest(_)));
    assert!(form.entries().is_empty());
}

#[test]
fn payment_matches_value_or_label_ignoring_case() {
    let options = FakeForm::new().payments;
    assert_eq!(match_payment(&options, "PIX").map(|o| o.value.as_str()), Some("pix"));
    assert_eq!(match_payment(&options, "dinheiro").map(|o| o.value.as_str()), Some("1"));
    assert!(match_payment(&options, "cartão").is_none());
}

#[test]
fn suggestion_match_ignores_blank_names() {
    assert_eq!(match_suggestion(&ids(&["Ana"]), "  "), None);
}

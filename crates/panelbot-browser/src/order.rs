//! Multi-step order entry with partial-failure bookkeeping.
//!
//! The sequencer only talks to an [`OrderForm`]; the Saborite PDV page is one
//! implementation. Stages advance strictly in order and any error moves the
//! sequencer into the absorbing [`OrderStage::Failed`] state.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use panelbot_core::SubmissionOutcome;

use crate::error::BrowserError;
use crate::retry::{retry_batch, RetryPolicy};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomer {
    pub nome: String,
    pub telefone: String,
    pub cep: String,
    pub bairro: String,
    pub endereco: String,
    pub numero: String,
    pub complemento: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerChoice {
    /// Register a new customer through the PDV form.
    New(NewCustomer),
    /// Pick an existing customer through the name autocomplete.
    Existing { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub customer: CustomerChoice,
    /// Requested product ids, duplicates meaning repeated lines.
    pub product_ids: Vec<String>,
    pub payment: String,
}

impl OrderRequest {
    /// # Errors
    ///
    /// Returns [`BrowserError::InvalidRequest`] for an empty product list,
    /// blank ids, a blank payment method, a customer without a name, or a new
    /// customer without a bairro.
    pub fn validate(&self) -> Result<(), BrowserError> {
        if self.product_ids.is_empty() {
            return Err(BrowserError::InvalidRequest(
                "id_produtos must list at least one product".to_owned(),
            ));
        }
        if self.product_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(BrowserError::InvalidRequest(
                "id_produtos must not contain empty ids".to_owned(),
            ));
        }
        if self.payment.trim().is_empty() {
            return Err(BrowserError::InvalidRequest(
                "pagamento is required".to_owned(),
            ));
        }
        let name = match &self.customer {
            CustomerChoice::New(customer) => {
                if customer.bairro.trim().is_empty() {
                    return Err(BrowserError::InvalidRequest(
                        "bairro is required for a new customer".to_owned(),
                    ));
                }
                &customer.nome
            }
            CustomerChoice::Existing { name } => name,
        };
        if name.trim().is_empty() {
            return Err(BrowserError::InvalidRequest("nome is required".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStage {
    Init,
    CustomerResolved,
    LinesReconciled,
    PaymentSelected,
    Finalized,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOption {
    pub value: String,
    pub label: String,
}

/// Order-entry screen operations, each awaited to completion.
#[async_trait]
pub trait OrderForm: Send + Sync {
    /// Loads the order-entry screen.
    async fn open(&self) -> Result<(), BrowserError>;

    async fn create_customer(&self, customer: &NewCustomer) -> Result<(), BrowserError>;

    /// Types `name` into the customer autocomplete and returns the suggestion texts.
    async fn customer_suggestions(&self, name: &str) -> Result<Vec<String>, BrowserError>;

    async fn pick_suggestion(&self, index: usize) -> Result<(), BrowserError>;

    async fn add_line(&self, product_id: &str) -> Result<(), BrowserError>;

    /// Product ids of the lines currently in the order, one entry per line.
    async fn line_ids(&self) -> Result<Vec<String>, BrowserError>;

    /// Removes one line carrying `product_id`.
    async fn remove_line(&self, product_id: &str) -> Result<(), BrowserError>;

    async fn payment_options(&self) -> Result<Vec<PaymentOption>, BrowserError>;

    async fn select_payment(&self, option: &PaymentOption) -> Result<(), BrowserError>;

    /// Submits the order. Nothing is read back.
    async fn finalize(&self) -> Result<(), BrowserError>;
}

/// Index of the first suggestion containing `name`, ignoring case.
#[must_use]
pub fn match_suggestion(suggestions: &[String], name: &str) -> Option<usize> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    suggestions
        .iter()
        .position(|text| text.to_lowercase().contains(&needle))
}

/// Option whose value or label equals `requested`, ignoring case.
#[must_use]
pub fn match_payment<'a>(options: &'a [PaymentOption], requested: &str) -> Option<&'a PaymentOption> {
    let requested = requested.trim();
    options.iter().find(|opt| {
        opt.value.trim().eq_ignore_ascii_case(requested)
            || opt.label.trim().to_lowercase() == requested.to_lowercase()
    })
}

/// Drives one order through every stage on an [`OrderForm`].
pub struct OrderSequencer<'a, F: OrderForm + ?Sized> {
    form: &'a F,
    line_policy: RetryPolicy,
    stage: OrderStage,
}

impl<'a, F: OrderForm + ?Sized> OrderSequencer<'a, F> {
    #[must_use]
    pub fn new(form: &'a F, line_policy: RetryPolicy) -> Self {
        Self {
            form,
            line_policy,
            stage: OrderStage::Init,
        }
    }

    #[must_use]
    pub fn stage(&self) -> OrderStage {
        self.stage
    }

    /// Runs the order from [`OrderStage::Init`] to [`OrderStage::Finalized`].
    ///
    /// Rejected lines do not fail the order; they are reported in the outcome.
    ///
    /// # Errors
    ///
    /// - [`BrowserError::InvalidRequest`] if called outside `Init` or the
    ///   request is malformed.
    /// - [`BrowserError::CustomerNotResolved`] when no suggestion matches.
    /// - [`BrowserError::PaymentMethodInvalid`] when the method is not offered.
    /// - Any driver error from the form.
    pub async fn submit(&mut self, request: &OrderRequest) -> Result<SubmissionOutcome, BrowserError> {
        if self.stage != OrderStage::Init {
            return Err(BrowserError::InvalidRequest(format!(
                "order sequencer already in stage {:?}",
                self.stage
            )));
        }
        let result = self.run(request).await;
        if let Err(err) = &result {
            tracing::error!(stage = ?self.stage, error = %err, "order submission failed");
            self.stage = OrderStage::Failed;
        }
        result
    }

    async fn run(&mut self, request: &OrderRequest) -> Result<SubmissionOutcome, BrowserError> {
        request.validate()?;
        self.form.open().await?;

        self.resolve_customer(&request.customer).await?;
        self.stage = OrderStage::CustomerResolved;

        let outcome = self.reconcile_lines(&request.product_ids).await?;
        self.stage = OrderStage::LinesReconciled;

        self.choose_payment(&request.payment).await?;
        self.stage = OrderStage::PaymentSelected;

        self.form.finalize().await?;
        self.stage = OrderStage::Finalized;

        tracing::info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "order finalized"
        );
        Ok(outcome)
    }

    async fn resolve_customer(&self, customer: &CustomerChoice) -> Result<(), BrowserError> {
        match customer {
            CustomerChoice::New(new) => {
                tracing::info!(nome = %new.nome, "registering new customer");
                self.form.create_customer(new).await
            }
            CustomerChoice::Existing { name } => {
                let suggestions = self.form.customer_suggestions(name).await?;
                let index = match_suggestion(&suggestions, name).ok_or_else(|| {
                    BrowserError::CustomerNotResolved { name: name.clone() }
                })?;
                tracing::info!(nome = %name, suggestion = %suggestions[index], "existing customer matched");
                self.form.pick_suggestion(index).await
            }
        }
    }

    /// Adds every requested line, trims the order to the requested counts and
    /// reports each id by what the final line snapshot shows.
    async fn reconcile_lines(&self, requested: &[String]) -> Result<SubmissionOutcome, BrowserError> {
        let form = self.form;
        let slots = line_slots(requested);
        let batch = retry_batch(self.line_policy, "order line", &slots, move |(id, ordinal)| async move {
            // A line that rendered after the previous pass gave up is already there.
            if count_of(&form.line_ids().await?, &id) >= ordinal {
                return Ok(true);
            }
            form.add_line(&id).await?;
            Ok(count_of(&form.line_ids().await?, &id) >= ordinal)
        })
        .await;
        tracing::info!(
            confirmed = batch.succeeded.len(),
            unconfirmed = batch.failed.len(),
            "order lines added"
        );

        let wanted = wanted_counts(requested);
        let snapshot = form.line_ids().await?;
        let mut kept: HashMap<&str, usize> = HashMap::new();
        for line in &snapshot {
            let limit = wanted.get(line.as_str()).copied().unwrap_or(0);
            let count = kept.entry(line.as_str()).or_default();
            if *count < limit {
                *count += 1;
                continue;
            }
            if limit == 0 {
                tracing::warn!(product_id = %line, "removing unrequested order line");
            } else {
                tracing::warn!(product_id = %line, requested = limit, "removing surplus order line");
            }
            if let Err(err) = form.remove_line(line).await {
                tracing::warn!(product_id = %line, error = %err, "could not remove order line");
            }
        }

        let final_lines = form.line_ids().await?;
        Ok(outcome_from_lines(requested, &wanted, &final_lines))
    }

    async fn choose_payment(&self, requested: &str) -> Result<(), BrowserError> {
        let options = self.form.payment_options().await?;
        let option = match_payment(&options, requested).ok_or_else(|| {
            BrowserError::PaymentMethodInvalid {
                method: requested.to_owned(),
            }
        })?;
        self.form.select_payment(option).await
    }
}

fn count_of(lines: &[String], id: &str) -> usize {
    lines.iter().filter(|line| line.as_str() == id).count()
}

/// Each requested id paired with its 1-based occurrence number, so the n-th
/// copy of an id is confirmed once at least n lines carry it.
fn line_slots(requested: &[String]) -> Vec<(String, usize)> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    requested
        .iter()
        .map(|id| {
            let ordinal = seen.entry(id.as_str()).or_default();
            *ordinal += 1;
            (id.clone(), *ordinal)
        })
        .collect()
}

fn wanted_counts(requested: &[String]) -> HashMap<&str, usize> {
    let mut wanted = HashMap::new();
    for id in requested {
        *wanted.entry(id.as_str()).or_default() += 1;
    }
    wanted
}

/// Collapses duplicates; an id is accepted only if all its requested copies
/// are in `lines`.
fn outcome_from_lines(
    requested: &[String],
    wanted: &HashMap<&str, usize>,
    lines: &[String],
) -> SubmissionOutcome {
    let mut seen = HashSet::new();
    let mut outcome = SubmissionOutcome::default();
    for id in requested {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let needed = wanted.get(id.as_str()).copied().unwrap_or(1);
        if count_of(lines, id) >= needed {
            outcome.accepted.push(id.clone());
        } else {
            outcome.rejected.push(id.clone());
        }
    }
    outcome
}

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;

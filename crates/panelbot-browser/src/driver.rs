//! The page surface every scraper drives.
//!
//! [`PageDriver`] keeps the required methods to the handful of operations that
//! need the devtools protocol directly. Selector queries, waits, clicks and
//! form fills are default methods built on [`PageDriver::evaluate`], so a
//! production driver only implements the primitives while test fakes can
//! override the higher-level calls they care about.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::BrowserError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Element state awaited by [`PageDriver::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    /// Present in the DOM, visible or not.
    Attached,
    /// Present and rendered with a non-empty box.
    Visible,
    /// Absent, or present without a rendered box.
    Hidden,
}

/// Modifier bitmask for `Input.dispatchKeyEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers(pub i64);

impl Modifiers {
    pub const SHIFT: Modifiers = Modifiers(8);
}

/// Quotes `raw` as a JavaScript string literal.
#[must_use]
pub fn js_literal(raw: &str) -> String {
    Value::String(raw.to_owned()).to_string()
}

/// Deserializes a script result, tagging failures with `context`.
///
/// # Errors
///
/// Returns [`BrowserError::Script`] if `value` does not match `T`.
pub fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T, BrowserError> {
    serde_json::from_value(value).map_err(|source| BrowserError::Script {
        context: context.to_owned(),
        source,
    })
}

fn timeout_error(selector: &str, timeout: Duration) -> BrowserError {
    BrowserError::Timeout {
        selector: selector.to_owned(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates and waits for the load event.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn reload(&self) -> Result<(), BrowserError>;

    async fn clear_cookies(&self) -> Result<(), BrowserError>;

    /// Evaluates `script` in the page and returns its JSON value
    /// (`null` for `undefined`).
    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError>;

    /// Focuses the element and types `text` with real key events.
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Sends a key down/up pair to the focused document.
    async fn press_key(&self, key: &str, modifiers: Modifiers) -> Result<(), BrowserError>;

    /// Closes the page and its browser. Idempotent.
    async fn close(&self) -> Result<(), BrowserError>;

    /// Fixed pause for markup that settles without an observable signal.
    async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        let script = format!("!!document.querySelector({})", js_literal(selector));
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    /// One-shot check of `state` for the first element matching `selector`.
    async fn probe(&self, selector: &str, state: WaitState) -> Result<bool, BrowserError> {
        let check = match state {
            WaitState::Attached => "!!el",
            WaitState::Visible => "visible",
            WaitState::Hidden => "!visible",
        };
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             const visible = !!el && !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
             && getComputedStyle(el).visibility !== 'hidden'; return {check}; }})()",
            sel = js_literal(selector),
        );
        Ok(self.evaluate(&script).await?.as_bool().unwrap_or(false))
    }

    /// Polls until `selector` reaches `state` or `timeout` elapses.
    ///
    /// Probe errors (a navigation tearing down the execution context) count
    /// as "not yet".
    async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.probe(selector, state).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) => tracing::debug!(selector, error = %err, "probe failed"),
            }
            if Instant::now() >= deadline {
                return Err(timeout_error(selector, timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
            js_literal(selector)
        );
        if self.evaluate(&script).await?.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_owned(),
            })
        }
    }

    /// Replaces an input's value and fires `input` and `change`.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
             el.focus(); el.value = {val}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            sel = js_literal(selector),
            val = js_literal(value),
        );
        if self.evaluate(&script).await?.as_bool().unwrap_or(false) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_owned(),
            })
        }
    }

    /// Selects the option whose value or label equals `value`.
    ///
    /// Returns `false` if the select exists but offers no such option.
    async fn select_option(&self, selector: &str, value: &str) -> Result<bool, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             const opt = Array.from(el.options).find(o => o.value === {val} || o.text.trim() === {val}); \
             if (!opt) return false; el.value = opt.value; \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
            sel = js_literal(selector),
            val = js_literal(value),
        );
        match self.evaluate(&script).await? {
            Value::Bool(selected) => Ok(selected),
            _ => Err(BrowserError::ElementNotFound {
                selector: selector.to_owned(),
            }),
        }
    }

    /// Trimmed `innerHTML` of the first match, or `None` if absent.
    async fn inner_html(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerHTML.trim() : null; }})()",
            js_literal(selector)
        );
        decode(self.evaluate(&script).await?, selector)
    }
}

/// Opens one exclusively-owned page per call.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, BrowserError>;
}

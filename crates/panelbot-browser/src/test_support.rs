//! In-memory [`PageDriver`] for unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{Modifiers, PageDriver, WaitState};
use crate::error::BrowserError;

/// Records every call and answers selector queries from a set of
/// "present" selectors. Scripted `evaluate` results are served in order.
#[derive(Default)]
pub(crate) struct FakePage {
    calls: Mutex<Vec<String>>,
    present: Mutex<HashSet<String>>,
    evaluations: Mutex<VecDeque<Value>>,
    scripts: Mutex<Vec<String>>,
}

impl FakePage {
    pub(crate) fn with_present(selectors: &[&str]) -> Self {
        let page = Self::default();
        for selector in selectors {
            page.show(selector);
        }
        page
    }

    pub(crate) fn show(&self, selector: &str) {
        self.present.lock().unwrap().insert(selector.to_owned());
    }

    pub(crate) fn push_evaluation(&self, value: Value) {
        self.evaluations.lock().unwrap().push_back(value);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every script passed to `evaluate`, in call order.
    pub(crate) fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn is_present(&self, selector: &str) -> bool {
        self.present.lock().unwrap().contains(selector)
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("goto {url}"));
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        self.record("reload".to_owned());
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<(), BrowserError> {
        self.record("clear_cookies".to_owned());
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        self.record("evaluate".to_owned());
        self.scripts.lock().unwrap().push(script.to_owned());
        Ok(self
            .evaluations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Value::Null))
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.record(format!("type {selector} {text}"));
        Ok(())
    }

    async fn press_key(&self, key: &str, modifiers: Modifiers) -> Result<(), BrowserError> {
        self.record(format!("key {key} {}", modifiers.0));
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.record("close".to_owned());
        Ok(())
    }

    async fn settle(&self, _delay: Duration) {}

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.is_present(selector))
    }

    async fn wait_for(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.record(format!("wait {selector}"));
        let present = self.is_present(selector);
        let reached = match state {
            WaitState::Attached | WaitState::Visible => present,
            WaitState::Hidden => !present,
        };
        if reached {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                selector: selector.to_owned(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.record(format!("click {selector}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), BrowserError> {
        self.record(format!("fill {selector} {value}"));
        Ok(())
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<bool, BrowserError> {
        self.record(format!("select {selector} {value}"));
        Ok(true)
    }
}

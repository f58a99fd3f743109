//! `chromiumoxide`-backed [`PageDriver`].

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use panelbot_core::BrowserMode;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::driver::{BrowserLauncher, Modifiers, PageDriver};
use crate::error::BrowserError;

/// Launches a local Chromium or attaches to a remote devtools endpoint,
/// depending on the configured [`BrowserMode`].
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    mode: BrowserMode,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(mode: BrowserMode) -> Self {
        Self { mode }
    }

    async fn start(&self) -> Result<(Browser, chromiumoxide::Handler), BrowserError> {
        match &self.mode {
            BrowserMode::Launch {
                headless,
                chrome_path,
            } => {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .arg("--disable-dev-shm-usage");
                if !headless {
                    builder = builder.with_head();
                }
                if let Some(path) = chrome_path {
                    builder = builder.chrome_executable(path);
                }
                let config = builder.build().map_err(BrowserError::Launch)?;
                Browser::launch(config)
                    .await
                    .map_err(|e| BrowserError::Launch(e.to_string()))
            }
            BrowserMode::Connect { ws_url } => Browser::connect(ws_url.as_str())
                .await
                .map_err(|e| BrowserError::Launch(e.to_string())),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageDriver>, BrowserError> {
        let (browser, mut handler) = self.start().await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        tracing::debug!("browser page opened");
        Ok(Box::new(ChromiumDriver {
            page,
            browser: Mutex::new(Some(browser)),
            handler_task,
        }))
    }
}

pub struct ChromiumDriver {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler_task: JoinHandle<()>,
}

impl ChromiumDriver {
    async fn dispatch_key(
        &self,
        kind: DispatchKeyEventType,
        key: &str,
        modifiers: Modifiers,
    ) -> Result<(), BrowserError> {
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .modifiers(modifiers.0);
        if let [ch] = key.as_bytes() {
            if ch.is_ascii_alphabetic() {
                let upper = ch.to_ascii_uppercase();
                builder = builder
                    .code(format!("Key{}", char::from(upper)))
                    .windows_virtual_key_code(i64::from(upper));
            }
        }
        let params = builder.build().map_err(BrowserError::Command)?;
        self.page.execute(params).await?;
        Ok(())
    }
}

fn navigation_error(url: &str, err: &CdpError) -> BrowserError {
    tracing::warn!(url, error = %err, "navigation failed");
    BrowserError::Navigation {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        tracing::debug!(url, "navigating");
        self.page
            .goto(url)
            .await
            .map_err(|e| navigation_error(url, &e))?;
        Ok(())
    }

    async fn reload(&self) -> Result<(), BrowserError> {
        if let Err(e) = self.page.reload().await {
            let url = self.page.url().await.ok().flatten().unwrap_or_default();
            return Err(navigation_error(&url, &e));
        }
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<(), BrowserError> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound {
                selector: selector.to_owned(),
            })?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_key(&self, key: &str, modifiers: Modifiers) -> Result<(), BrowserError> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, key, modifiers)
            .await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key, modifiers)
            .await
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };
        let result = browser.close().await;
        self.handler_task.abort();
        result?;
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

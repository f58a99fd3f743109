use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How a browser session is obtained for each request.
#[derive(Clone, PartialEq, Eq)]
pub enum BrowserMode {
    /// Spawn a local Chromium process per request.
    Launch {
        headless: bool,
        chrome_path: Option<PathBuf>,
    },
    /// Attach to a remote DevTools websocket (e.g. a browserless instance).
    /// The URL may embed an access token, so it is never logged.
    Connect { ws_url: String },
}

impl std::fmt::Debug for BrowserMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserMode::Launch {
                headless,
                chrome_path,
            } => f
                .debug_struct("Launch")
                .field("headless", headless)
                .field("chrome_path", chrome_path)
                .finish(),
            BrowserMode::Connect { .. } => f
                .debug_struct("Connect")
                .field("ws_url", &"[redacted]")
                .finish(),
        }
    }
}

/// Bounded waits and retry knobs shared by every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub element_timeout_ms: u64,
    pub login_timeout_ms: u64,
    pub frame_timeout_ms: u64,
    pub frame_attempts: u32,
    pub line_add_attempts: u32,
    pub retry_backoff_ms: u64,
    pub table_settle_ms: u64,
    pub order_settle_ms: u64,
}

impl Timings {
    #[must_use]
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    #[must_use]
    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    #[must_use]
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub fn table_settle(&self) -> Duration {
        Duration::from_millis(self.table_settle_ms)
    }

    #[must_use]
    pub fn order_settle(&self) -> Duration {
        Duration::from_millis(self.order_settle_ms)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            element_timeout_ms: 5_000,
            login_timeout_ms: 5_000,
            frame_timeout_ms: 30_000,
            frame_attempts: 3,
            line_add_attempts: 2,
            retry_backoff_ms: 2_000,
            table_settle_ms: 5_000,
            order_settle_ms: 3_000,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_secret: Option<String>,
    pub browser: BrowserMode,
    pub saborite_base_url: String,
    pub plus_base_url: String,
    pub saborite_credentials: Credentials,
    pub plus_credentials: Credentials,
    pub timings: Timings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[redacted]"))
            .field("browser", &self.browser)
            .field("saborite_base_url", &self.saborite_base_url)
            .field("plus_base_url", &self.plus_base_url)
            .field("saborite_credentials", &self.saborite_credentials)
            .field("plus_credentials", &self.plus_credentials)
            .field("timings", &self.timings)
            .finish()
    }
}

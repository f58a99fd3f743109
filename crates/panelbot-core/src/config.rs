use crate::app_config::{AppConfig, BrowserMode, Environment, Timings};
use crate::credentials::Credentials;
use crate::ConfigError;

const DEFAULT_SABORITE_BASE_URL: &str = "https://demonstracao.saborite.com";
const DEFAULT_PLUS_BASE_URL: &str = "https://minhaloja.plusdelivery.com.br";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        optional(var).map_or(Ok(default), |raw| {
            raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
        })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var).as_deref() {
            None => Ok(default),
            Some("1" | "true" | "yes") => Ok(true),
            Some("0" | "false" | "no") => Ok(false),
            Some(other) => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("PANELBOT_ENV", "development"))?;

    // PORT alone (as set by most PaaS runtimes) binds on all interfaces.
    let bind_raw = optional("PANELBOT_BIND_ADDR").unwrap_or_else(|| {
        optional("PORT").map_or_else(|| "0.0.0.0:3000".to_string(), |p| format!("0.0.0.0:{p}"))
    });
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PANELBOT_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("PANELBOT_LOG_LEVEL", "info");
    let api_secret = optional("PANELBOT_API_SECRET");

    let browser = match optional("PANELBOT_BROWSER_WS_URL") {
        Some(ws_url) => {
            if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
                return Err(invalid(
                    "PANELBOT_BROWSER_WS_URL",
                    "must start with ws:// or wss://".to_string(),
                ));
            }
            BrowserMode::Connect { ws_url }
        }
        None => BrowserMode::Launch {
            headless: parse_bool("PANELBOT_HEADLESS", true)?,
            chrome_path: optional("PANELBOT_CHROME_PATH").map(PathBuf::from),
        },
    };

    let saborite_base_url = normalize_base_url(
        "PANELBOT_SABORITE_BASE_URL",
        &or_default("PANELBOT_SABORITE_BASE_URL", DEFAULT_SABORITE_BASE_URL),
    )?;
    let plus_base_url = normalize_base_url(
        "PANELBOT_PLUS_BASE_URL",
        &or_default("PANELBOT_PLUS_BASE_URL", DEFAULT_PLUS_BASE_URL),
    )?;

    let plus_credentials = Credentials::new(
        optional("EMAIL").unwrap_or_default(),
        optional("SENHA").unwrap_or_default(),
    );
    let saborite_credentials = Credentials::new(
        optional("EMAIL_SABORITE").unwrap_or_default(),
        optional("SENHA_SABORITE").unwrap_or_default(),
    );

    let defaults = Timings::default();
    let timings = Timings {
        element_timeout_ms: parse_u64("PANELBOT_ELEMENT_TIMEOUT_MS", defaults.element_timeout_ms)?,
        login_timeout_ms: parse_u64("PANELBOT_LOGIN_TIMEOUT_MS", defaults.login_timeout_ms)?,
        frame_timeout_ms: parse_u64("PANELBOT_FRAME_TIMEOUT_MS", defaults.frame_timeout_ms)?,
        frame_attempts: parse_u32("PANELBOT_FRAME_ATTEMPTS", defaults.frame_attempts)?,
        line_add_attempts: parse_u32("PANELBOT_LINE_ADD_ATTEMPTS", defaults.line_add_attempts)?,
        retry_backoff_ms: parse_u64("PANELBOT_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,
        table_settle_ms: parse_u64("PANELBOT_TABLE_SETTLE_MS", defaults.table_settle_ms)?,
        order_settle_ms: parse_u64("PANELBOT_ORDER_SETTLE_MS", defaults.order_settle_ms)?,
    };

    if timings.frame_attempts == 0 {
        return Err(invalid("PANELBOT_FRAME_ATTEMPTS", "must be at least 1".to_string()));
    }
    if timings.line_add_attempts == 0 {
        return Err(invalid(
            "PANELBOT_LINE_ADD_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    if api_secret.is_none() && env == Environment::Production {
        return Err(ConfigError::MissingEnvVar("PANELBOT_API_SECRET".to_string()));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        api_secret,
        browser,
        saborite_base_url,
        plus_base_url,
        saborite_credentials,
        plus_credentials,
        timings,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PANELBOT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Require an http(s) scheme and strip trailing slashes so paths can be appended.
fn normalize_base_url(var: &str, raw: &str) -> Result<String, ConfigError> {
    if !(raw.starts_with("https://") || raw.starts_with("http://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("'{raw}' must start with http:// or https://"),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

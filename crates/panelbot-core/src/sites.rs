//! Per-site login contracts.

use std::fmt;

/// The vendor admin panels this service drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    Saborite,
    PlusDelivery,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKind::Saborite => write!(f, "saborite"),
            SiteKind::PlusDelivery => write!(f, "plus_delivery"),
        }
    }
}

/// How the presence of the login form on the landing page is interpreted.
///
/// The two panels disagree: PlusDelivery renders the form only for anonymous
/// visitors, while Saborite hides it behind an entry button and shows it
/// inline only once a session already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRequired {
    WhenFormPresent,
    WhenFormAbsent,
}

impl LoginRequired {
    #[must_use]
    pub fn needs_login(self, form_present: bool) -> bool {
        match self {
            LoginRequired::WhenFormPresent => form_present,
            LoginRequired::WhenFormAbsent => !form_present,
        }
    }
}

/// Everything the session establisher needs to log into one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub site: SiteKind,
    pub base_url: String,
    pub login_url: String,
    pub form_selector: &'static str,
    pub login_required: LoginRequired,
    /// Clicked before filling when the form is hidden on the landing page.
    pub entry_selector: Option<&'static str>,
    pub identifier_selector: &'static str,
    pub secret_selector: &'static str,
    pub submit_selector: &'static str,
    pub authenticated_marker: &'static str,
}

impl SessionProfile {
    #[must_use]
    pub fn saborite(base_url: &str) -> Self {
        Self {
            site: SiteKind::Saborite,
            base_url: base_url.to_string(),
            login_url: format!("{base_url}/entrar/administracao/"),
            form_selector: r#"input[name="email"]"#,
            login_required: LoginRequired::WhenFormAbsent,
            entry_selector: Some("a.btn.btn-primary.my-3"),
            identifier_selector: r#"input[name="email"]"#,
            secret_selector: r#"input[name="senha"]"#,
            submit_selector: r#"input[type="submit"]"#,
            authenticated_marker: ".logo",
        }
    }

    #[must_use]
    pub fn plus_delivery(base_url: &str) -> Self {
        Self {
            site: SiteKind::PlusDelivery,
            base_url: base_url.to_string(),
            login_url: format!("{base_url}/admin/login/"),
            form_selector: r#"input[name="login"]"#,
            login_required: LoginRequired::WhenFormPresent,
            entry_selector: None,
            identifier_selector: r#"input[name="login"]"#,
            secret_selector: r#"input[name="senha"]"#,
            submit_selector: r#"input[type="submit"]"#,
            authenticated_marker: ".navbar-brand",
        }
    }

    /// Joins a site-relative path onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

use thiserror::Error;

/// Returned when either half of a credential pair is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("email and senha are required")]
pub struct CredentialsMissing;

/// Login pair for a vendor admin panel. Either field may be empty until
/// [`Credentials::require`] is called.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub senha: String,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, senha: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            senha: senha.into(),
        }
    }

    /// Combine request-supplied values with server-side defaults.
    ///
    /// A field that is absent or empty in the request falls back to the
    /// default for that field only.
    #[must_use]
    pub fn resolve(email: Option<&str>, senha: Option<&str>, fallback: &Credentials) -> Self {
        let pick = |given: Option<&str>, default: &str| {
            given
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_owned()
        };
        Self {
            email: pick(email, &fallback.email),
            senha: pick(senha, &fallback.senha),
        }
    }

    /// # Errors
    ///
    /// Returns [`CredentialsMissing`] if either field is empty or whitespace.
    pub fn require(&self) -> Result<&Self, CredentialsMissing> {
        if self.email.trim().is_empty() || self.senha.trim().is_empty() {
            return Err(CredentialsMissing);
        }
        Ok(self)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("senha", &if self.senha.is_empty() { "" } else { "[redacted]" })
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_request_values() {
        let fallback = Credentials::new("env@example.com", "env-pass");
        let creds = Credentials::resolve(Some("q@example.com"), Some("q-pass"), &fallback);
        assert_eq!(creds, Credentials::new("q@example.com", "q-pass"));
    }

    #[test]
    fn resolve_falls_back_per_field_on_empty_or_missing() {
        let fallback = Credentials::new("env@example.com", "env-pass");
        let creds = Credentials::resolve(Some(""), None, &fallback);
        assert_eq!(creds, fallback);

        let creds = Credentials::resolve(Some("q@example.com"), Some(""), &fallback);
        assert_eq!(creds, Credentials::new("q@example.com", "env-pass"));
    }

    #[test]
    fn require_rejects_either_empty_field() {
        assert_eq!(
            Credentials::new("", "x").require().unwrap_err(),
            CredentialsMissing
        );
        assert_eq!(
            Credentials::new("a@b.c", "  ").require().unwrap_err(),
            CredentialsMissing
        );
        assert!(Credentials::new("a@b.c", "x").require().is_ok());
    }

    #[test]
    fn debug_redacts_senha() {
        let rendered = format!("{:?}", Credentials::new("a@b.c", "hunter2"));
        assert!(rendered.contains("a@b.c"));
        assert!(!rendered.contains("hunter2"));
    }
}

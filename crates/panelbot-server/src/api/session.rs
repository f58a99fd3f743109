//! One logged-in browser page per request, closed on every exit path.

use panelbot_browser::{establish_session, BrowserError, PageDriver};
use panelbot_core::{Credentials, SessionProfile};

use super::{ApiError, AppState, CredentialParams};

pub(super) struct BrowserSession {
    driver: Box<dyn PageDriver>,
    profile: SessionProfile,
}

impl BrowserSession {
    pub(super) async fn saborite(state: &AppState, params: &CredentialParams) -> Result<Self, ApiError> {
        let credentials = Credentials::resolve(
            params.email.as_deref(),
            params.senha.as_deref(),
            &state.config.saborite_credentials,
        );
        Self::open(state, SessionProfile::saborite(&state.config.saborite_base_url), &credentials).await
    }

    pub(super) async fn plus_delivery(state: &AppState, params: &CredentialParams) -> Result<Self, ApiError> {
        let credentials = Credentials::resolve(
            params.email.as_deref(),
            params.senha.as_deref(),
            &state.config.plus_credentials,
        );
        Self::open(state, SessionProfile::plus_delivery(&state.config.plus_base_url), &credentials).await
    }

    /// Checks credentials before any browser is launched, then logs in.
    async fn open(
        state: &AppState,
        profile: SessionProfile,
        credentials: &Credentials,
    ) -> Result<Self, ApiError> {
        credentials.require().map_err(BrowserError::from)?;

        tracing::info!(site = %profile.site, "launching browser session");
        let driver = state.launcher.launch().await?;
        let session = Self { driver, profile };

        if let Err(err) = establish_session(
            session.driver(),
            &session.profile,
            credentials,
            &state.config.timings,
        )
        .await
        {
            session.close().await;
            return Err(err.into());
        }
        Ok(session)
    }

    pub(super) fn driver(&self) -> &dyn PageDriver {
        self.driver.as_ref()
    }

    pub(super) fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    /// Closes the browser and converts the flow's result into the API error shape.
    pub(super) async fn finish<T>(self, result: Result<T, BrowserError>) -> Result<T, ApiError> {
        self.close().await;
        result.map_err(ApiError::from)
    }

    async fn close(&self) {
        if let Err(err) = self.driver.close().await {
            tracing::warn!(site = %self.profile.site, error = %err, "failed to close browser session");
        }
    }
}

use panelbot_core::{Credentials, SessionProfile, Timings};

use crate::driver::{PageDriver, WaitState};
use crate::error::BrowserError;

/// Logs into the site described by `profile` on a fresh page.
///
/// Cookies are cleared first so a session left behind by a previous request
/// never leaks into this one. Whether the login form must be filled is
/// decided by the profile's [`LoginRequired`](panelbot_core::LoginRequired)
/// predicate; either way the authenticated marker must appear within the
/// login timeout.
///
/// # Errors
///
/// - [`BrowserError::CredentialsMissing`] before touching the page if either
///   credential is empty.
/// - [`BrowserError::LoginFailed`] if the marker never appears.
/// - Any driver error from navigation or form interaction.
pub async fn establish_session(
    driver: &dyn PageDriver,
    profile: &SessionProfile,
    credentials: &Credentials,
    timings: &Timings,
) -> Result<(), BrowserError> {
    let credentials = credentials.require()?;
    let site = profile.site;

    tracing::info!(%site, email = %credentials.email, "establishing session");
    driver.clear_cookies().await?;
    driver.goto(&profile.login_url).await?;

    let form_present = driver.exists(profile.form_selector).await?;
    if profile.login_required.needs_login(form_present) {
        if let Some(entry) = profile.entry_selector {
            driver.click(entry).await?;
            driver
                .wait_for(
                    profile.identifier_selector,
                    WaitState::Visible,
                    timings.element_timeout(),
                )
                .await?;
        }
        driver
            .type_into(profile.identifier_selector, &credentials.email)
            .await?;
        driver
            .type_into(profile.secret_selector, &credentials.senha)
            .await?;
        tracing::info!(%site, "submitting login form");
        driver.click(profile.submit_selector).await?;
    } else {
        tracing::info!(%site, "session already active");
    }

    match driver
        .wait_for(
            profile.authenticated_marker,
            WaitState::Attached,
            timings.login_timeout(),
        )
        .await
    {
        Ok(()) => {
            tracing::info!(%site, "login succeeded");
            Ok(())
        }
        Err(BrowserError::Timeout { .. }) => {
            tracing::warn!(%site, "authenticated marker did not appear");
            Err(BrowserError::LoginFailed { site })
        }
        Err(err) => Err(err),
    }
}

//! Sign-in stage

use tracing::debug;

use super::PipelineContext;
use crate::errors::{LeadError, LeadResult};
use crate::runtime::settle;
use crate::session::{ClickOutcome, PageSession};

/// Sign in to the portal
///
/// The sign-in page sometimes opens behind a dialog; when it does, the
/// page is loaded once more before the form is filled.
pub async fn sign_in(session: &mut dyn PageSession, ctx: &PipelineContext) -> LeadResult<()> {
    let locators = ctx.locators();
    let timing = ctx.timing();

    session.navigate(&locators.sign_in_url).await?;
    settle(timing.navigation_settle, ctx.cancel()).await?;
    session.wait_until_ready(timing.page_ready_timeout).await?;

    if session.exists(&locators.interstitial_dialog).await? {
        debug!("Sign-in page opened behind a dialog; reloading");
        session.navigate(&locators.sign_in_url).await?;
        settle(timing.interstitial_settle, ctx.cancel()).await?;
        session.wait_until_ready(timing.page_ready_timeout).await?;
    }

    let credentials = ctx.config().credentials();
    session
        .send_keys(&locators.email_input, credentials.email())
        .await?;
    session
        .send_keys(&locators.password_input, credentials.password())
        .await?;

    match session.click(&locators.sign_in_button).await? {
        ClickOutcome::Clicked => {}
        ClickOutcome::Intercepted => {
            return Err(LeadError::Intercepted(locators.sign_in_button.to_string()));
        }
    }
    settle(timing.login_settle, ctx.cancel()).await
}

//! Address search stage

use tracing::{debug, info, warn};

use super::{PipelineContext, read_optional};
use crate::errors::{LeadError, LeadResult};
use crate::runtime::{Poller, Tick, jittered, settle};
use crate::session::{ClickOutcome, PageSession};
use crate::utils::constants::NO_LOCATION_FOUND;

/// Upper bound on close clicks while a dialog keeps reappearing
const MAX_DIALOG_DISMISSALS: usize = 10;

/// Search for `address` and land on its details page
pub async fn search(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
    address: &str,
) -> LeadResult<()> {
    let locators = ctx.locators();
    let timing = ctx.timing();

    wait_for_search_input(session, ctx).await?;

    // Focus the input; an overlay may be in the way once
    let mut dismissed = false;
    loop {
        match session.click(&locators.search_input).await? {
            ClickOutcome::Clicked => break,
            ClickOutcome::Intercepted if dismissed => {
                return Err(LeadError::Intercepted(locators.search_input.to_string()));
            }
            ClickOutcome::Intercepted => {
                match dismiss_overlays(session, ctx).await {
                    Ok(closed) => debug!(closed, "Dismissed overlay before search"),
                    Err(LeadError::Cancelled) => return Err(LeadError::Cancelled),
                    Err(e) => {
                        info!("{address} likely does not exist ({e})");
                        return Err(LeadError::LikelyMissing);
                    }
                }
                dismissed = true;
            }
        }
    }

    session.send_keys(&locators.search_input, address).await?;
    if session.click(&locators.search_button).await? == ClickOutcome::Intercepted {
        return Err(LeadError::Intercepted(locators.search_button.to_string()));
    }

    settle(timing.search_settle, ctx.cancel()).await?;
    if let Some(message) = read_optional(session, &locators.search_message).await?
        && message.contains(NO_LOCATION_FOUND)
    {
        return Err(LeadError::NoSuchProperty);
    }

    session.wait_until_ready(timing.page_ready_timeout).await?;
    Ok(())
}

/// Poll for the search input, refreshing the page each time the soft
/// deadline passes without it
async fn wait_for_search_input(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<()> {
    let locators = ctx.locators();
    let timing = ctx.timing();
    let max_refreshes = ctx.config().max_search_refreshes();

    let mut poller =
        Poller::new(&timing.poll, ctx.cancel()).with_soft_deadline(timing.search_soft_deadline);
    while !session.exists(&locators.search_input).await? {
        if let Tick::DeadlineReached { cycle } = poller.tick().await? {
            if max_refreshes.is_some_and(|max| cycle > max) {
                return Err(LeadError::NotFound(locators.search_input.to_string()));
            }
            warn!(cycle, "Search input missing after {:?}; refreshing", timing.search_soft_deadline);
            session.refresh().await?;
            settle(timing.refresh_settle, ctx.cancel()).await?;
        }
    }
    Ok(())
}

/// Close the status dialog until it is gone
///
/// Returns how many close clicks were needed. Fails if the close button
/// cannot be clicked or the dialog keeps coming back.
pub async fn dismiss_overlays(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<usize> {
    let locators = ctx.locators();
    let timing = ctx.timing();

    let mut closed = 0;
    while session.exists(&locators.overlay_dialog).await? {
        if closed >= MAX_DIALOG_DISMISSALS {
            return Err(LeadError::Intercepted(locators.overlay_dialog.to_string()));
        }
        match session.click(&locators.overlay_close_button).await? {
            ClickOutcome::Clicked => closed += 1,
            ClickOutcome::Intercepted => {
                return Err(LeadError::Intercepted(
                    locators.overlay_close_button.to_string(),
                ));
            }
        }
        let pause = jittered(timing.dialog_settle_min..=timing.dialog_settle_max);
        settle(pause, ctx.cancel()).await?;
    }
    Ok(closed)
}

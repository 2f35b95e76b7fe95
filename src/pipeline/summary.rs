//! Summary facts: estimated value, activity, parcel and owner details

use rand::Rng;
use tracing::{debug, trace};

use super::{PipelineContext, read_optional};
use crate::errors::LeadResult;
use crate::runtime::settle;
use crate::session::PageSession;
use crate::utils::constants::{NO_CLOSED_PRICE_SENTINEL, PRICE_NOT_AVAILABLE};

/// Owner panel lists and items probed at most
const MAX_OWNER_LISTS: usize = 16;
const MAX_OWNER_ITEMS: usize = 32;

/// Report text for a raw estimated value
///
/// The site's "no closed price" sentinel is shown as a friendlier message;
/// anything else is only trimmed.
#[must_use]
pub fn display_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == NO_CLOSED_PRICE_SENTINEL {
        PRICE_NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Vertical scroll steps that read like a person skimming the page
///
/// Down a random 900-1200 px in 50-200 px steps, then back up about
/// 500 px the same way.
pub fn scroll_plan(rng: &mut impl Rng) -> Vec<i64> {
    let mut steps = Vec::new();

    let down_target: i64 = rng.random_range(900..=1200);
    let mut travelled = 0;
    while travelled < down_target {
        let step = rng.random_range(50..=200);
        travelled += step;
        steps.push(step);
    }

    let mut travelled = 0;
    while travelled < 500 {
        let step = rng.random_range(50..=200);
        travelled += step;
        steps.push(-step);
    }
    steps
}

/// Scroll the details page, then give lazy panels time to render
pub async fn humanized_scroll(session: &mut dyn PageSession, ctx: &PipelineContext) -> LeadResult<()> {
    let plan = scroll_plan(&mut rand::rng());
    trace!(steps = plan.len(), "Scrolling details page");
    for step in plan {
        session.scroll_by(step).await?;
        settle(ctx.timing().scroll_step, ctx.cancel()).await?;
    }
    settle(ctx.timing().scroll_settle, ctx.cancel()).await
}

/// Raw estimated value from the first locator that resolves
///
/// Falls back to the "no closed price" sentinel when none does.
pub async fn estimated_value(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<String> {
    for locator in &ctx.locators().estimated_value {
        if let Some(text) = read_optional(session, locator).await? {
            return Ok(text);
        }
        trace!(%locator, "Estimated value not at locator");
    }
    debug!("No estimated value on page");
    Ok(NO_CLOSED_PRICE_SENTINEL.to_string())
}

/// General info read after the house features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralInfo {
    pub activity: String,
    pub parcel_number: String,
    pub owner_name: Option<String>,
    pub owner_facts: Vec<(String, String)>,
}

pub async fn general_info(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<GeneralInfo> {
    let locators = ctx.locators();
    let activity = read_optional(session, &locators.activity)
        .await?
        .unwrap_or_default();
    let parcel_number = read_optional(session, &locators.parcel_number)
        .await?
        .unwrap_or_default();
    let owner_name = read_optional(session, &locators.owner_name)
        .await?
        .map(|name| name.trim().to_string());
    let owner_facts = owner_facts(session, ctx).await?;

    Ok(GeneralInfo {
        activity,
        parcel_number,
        owner_name,
        owner_facts,
    })
}

/// Label/value pairs of the owner panel's fact lists
///
/// Items missing a label or value are skipped; a later duplicate label
/// replaces the earlier value.
pub async fn owner_facts(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<Vec<(String, String)>> {
    let base = &ctx.locators().owner_facts;
    let mut facts: Vec<(String, String)> = Vec::new();
    if !session.exists(base).await? {
        return Ok(facts);
    }

    for list in 1..=MAX_OWNER_LISTS {
        let list_locator = base.join(&format!("ul[{list}]"));
        if !session.exists(&list_locator).await? {
            break;
        }
        for item in 1..=MAX_OWNER_ITEMS {
            let item_locator = list_locator.join(&format!("li[{item}]"));
            if !session.exists(&item_locator).await? {
                break;
            }
            let label = read_optional(session, &item_locator.join("div[1]")).await?;
            let value = read_optional(session, &item_locator.join("div[2]/span")).await?;
            let (Some(label), Some(value)) = (label, value) else {
                continue;
            };
            let (label, value) = (label.trim().to_string(), value.trim().to_string());
            match facts.iter_mut().find(|(existing, _)| *existing == label) {
                Some(slot) => slot.1 = value,
                None => facts.push((label, value)),
            }
        }
    }
    Ok(facts)
}

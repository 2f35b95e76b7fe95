//! Tabbed record panels: deed, mortgage and distress history

use tracing::{debug, warn};

use super::{PipelineContext, read_optional};
use crate::errors::{LeadError, LeadResult};
use crate::harvester::harvest_table;
use crate::runtime::settle;
use crate::schema::SectionId;
use crate::session::{ClickOutcome, PageSession};
use crate::store::{AggregationStore, RowHandle};
use crate::utils::constants::TAX_PANEL_TITLE;

/// Harvest every record panel into `row`
///
/// Panels that are absent, unlabeled, titled `Tax` or of an unknown kind
/// are skipped. A tab that cannot be clicked ends the walk, leaving what
/// was already captured in place. Returns the number of cells written.
pub async fn capture_records(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
    store: &AggregationStore,
    row: &RowHandle,
) -> LeadResult<usize> {
    let mut written = 0;

    for index in 0..ctx.config().record_panel_count() {
        let panel = ctx.locators().record_panel(index);
        if !session.exists(&panel.tab).await? {
            debug!(index, "Record panel absent");
            continue;
        }

        let Some(title) = read_optional(session, &panel.label).await? else {
            continue;
        };
        let title = title.trim();
        if title == TAX_PANEL_TITLE {
            continue;
        }
        let Some(section) = SectionId::for_panel_title(title) else {
            debug!(index, title, "Ignoring record panel");
            continue;
        };

        match session.click(&panel.tab).await {
            Ok(ClickOutcome::Clicked) => {}
            Ok(ClickOutcome::Intercepted) => {
                warn!(index, title, "Record tab click intercepted; stopping");
                break;
            }
            Err(e) => {
                warn!(index, title, "Record tab click failed: {e}; stopping");
                break;
            }
        }
        settle(ctx.timing().tab_settle, ctx.cancel()).await?;

        // Long histories are collapsed behind "show more"
        if session.exists(&panel.show_more).await? {
            match session.click(&panel.show_more).await {
                Ok(ClickOutcome::Clicked) => {
                    settle(ctx.timing().tab_settle, ctx.cancel()).await?;
                }
                Ok(ClickOutcome::Intercepted) | Err(_) => {
                    debug!(index, title, "Show-more not clickable");
                }
            }
        }

        match harvest_table(session, &panel.table, store, row, section).await {
            Ok(count) => written += count,
            Err(LeadError::NotFound(_)) => debug!(index, title, "Record table absent"),
            Err(e) => return Err(e),
        }
    }

    Ok(written)
}

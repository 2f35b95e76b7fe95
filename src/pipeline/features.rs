//! House features stage

use tracing::trace;

use super::{PipelineContext, read_optional};
use crate::errors::LeadResult;
use crate::runtime::{Poller, with_deadline};
use crate::schema::HOUSE_FEATURE_TITLES;
use crate::session::PageSession;
use crate::utils::constants::{FEATURES_TABLE_HEADER, LOADING_PLACEHOLDER};

/// Strip the table caption and header line from the features block text
#[must_use]
pub fn preprocess_feature_text(raw: &str) -> String {
    raw.replace(FEATURES_TABLE_HEADER, "")
        .split('\n')
        .skip(1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Match each label against the block's lines
///
/// A label matches the first line containing it; its value is the next
/// line, trimmed. Labels without a following line are left out.
#[must_use]
pub fn parse_house_features(text: &str, labels: &[&str]) -> Vec<(String, String)> {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    labels
        .iter()
        .filter_map(|label| {
            lines
                .windows(2)
                .find(|pair| pair[0].contains(label))
                .map(|pair| ((*label).to_string(), pair[1].trim().to_string()))
        })
        .collect()
}

/// Read the house features under the configured hard deadline
///
/// Times out with [`LeadError::Timeout`](crate::errors::LeadError::Timeout)
/// if the block never finishes loading.
pub async fn house_features(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<Vec<(String, String)>> {
    with_deadline(
        poll_house_features(session, ctx),
        ctx.timing().feature_timeout,
        "house features",
        ctx.cancel(),
    )
    .await
}

async fn poll_house_features(
    session: &mut dyn PageSession,
    ctx: &PipelineContext,
) -> LeadResult<Vec<(String, String)>> {
    let locator = &ctx.locators().house_features;
    let mut poller = Poller::new(&ctx.timing().poll, ctx.cancel());
    loop {
        match read_optional(session, locator).await? {
            Some(text) if !text.contains(LOADING_PLACEHOLDER) => {
                let body = preprocess_feature_text(&text);
                return Ok(parse_house_features(&body, HOUSE_FEATURE_TITLES));
            }
            Some(_) => trace!("House features still loading"),
            None => trace!("House features block not rendered yet"),
        }
        poller.tick().await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_take_the_following_line() {
        let parsed = parse_house_features(
            "Bedrooms*\n3\nTotal Baths\n2",
            &["Bedrooms*", "Total Baths"],
        );
        assert_eq!(
            parsed,
            vec![
                ("Bedrooms*".to_string(), "3".to_string()),
                ("Total Baths".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn first_occurrence_wins_and_substrings_match() {
        let text = "Year Built* (est.)\n1978\nYear Built*\n1980\nGarage (spaces)";
        let parsed = parse_house_features(text, &["Year Built*", "Garage (spaces)", "Bedrooms*"]);
        assert_eq!(parsed, vec![("Year Built*".to_string(), "1978".to_string())]);
    }

    #[test]
    fn caption_and_first_line_are_dropped() {
        let raw = "Facts\nName Public Facts Your Changes\nProperty Type\nSingle Family";
        let body = preprocess_feature_text(raw);
        assert_eq!(body, "\nProperty Type\nSingle Family");
        assert_eq!(
            parse_house_features(&body, HOUSE_FEATURE_TITLES),
            vec![("Property Type".to_string(), "Single Family".to_string())]
        );
    }
}

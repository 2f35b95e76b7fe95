//! Per-lead pipeline states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a lead is in its pipeline
///
/// Stages advance strictly in declaration order; `Failed` is reachable
/// from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeadStage {
    Init,
    Authenticated,
    Searched,
    ValueExtracted,
    FeaturesExtracted,
    RecordsCaptured,
    Committed,
    Failed,
}

impl LeadStage {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// The stage that follows a successful step, if any
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::Authenticated),
            Self::Authenticated => Some(Self::Searched),
            Self::Searched => Some(Self::ValueExtracted),
            Self::ValueExtracted => Some(Self::FeaturesExtracted),
            Self::FeaturesExtracted => Some(Self::RecordsCaptured),
            Self::RecordsCaptured => Some(Self::Committed),
            Self::Committed | Self::Failed => None,
        }
    }

    /// Whether `to` is a legal transition from this stage
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Authenticated => "authenticated",
            Self::Searched => "searched",
            Self::ValueExtracted => "value extracted",
            Self::FeaturesExtracted => "features extracted",
            Self::RecordsCaptured => "records captured",
            Self::Committed => "committed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LeadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order() {
        let mut stage = LeadStage::Init;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            assert!(stage.can_transition_to(next));
            stage = next;
            visited.push(stage);
        }
        assert_eq!(stage, LeadStage::Committed);
        assert_eq!(visited.len(), 7);
    }

    #[test]
    fn failure_is_reachable_until_terminal() {
        assert!(LeadStage::Init.can_transition_to(LeadStage::Failed));
        assert!(LeadStage::RecordsCaptured.can_transition_to(LeadStage::Failed));
        assert!(!LeadStage::Committed.can_transition_to(LeadStage::Failed));
        assert!(!LeadStage::Failed.can_transition_to(LeadStage::Failed));
        assert!(!LeadStage::Init.can_transition_to(LeadStage::Searched));
    }
}

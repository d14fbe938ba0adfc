//! View-level filter selector and empty-state classification.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Predicate selector applied on top of the weekday/search query.
///
/// Not persisted. `AllTrackers` and `TodayTrackers` add no predicate; the
/// difference between them is which date gets queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    AllTrackers,
    TodayTrackers,
    CompletedTrackers,
    UncompletedTrackers,
}

impl FilterMode {
    pub const ALL: [FilterMode; 4] = [
        Self::AllTrackers,
        Self::TodayTrackers,
        Self::CompletedTrackers,
        Self::UncompletedTrackers,
    ];

    /// Stable machine-readable name, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllTrackers => "all_trackers",
            Self::TodayTrackers => "today_trackers",
            Self::CompletedTrackers => "completed_trackers",
            Self::UncompletedTrackers => "uncompleted_trackers",
        }
    }

    /// Whether the filter narrows by completion state.
    pub fn is_completion_filter(self) -> bool {
        matches!(self, Self::CompletedTrackers | Self::UncompletedTrackers)
    }
}

impl Display for FilterMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterModeError(pub String);

impl Display for ParseFilterModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown filter `{}`; expected all|today|completed|uncompleted",
            self.0
        )
    }
}

impl Error for ParseFilterModeError {}

impl FromStr for FilterMode {
    type Err = ParseFilterModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "all_trackers" => Ok(Self::AllTrackers),
            "today" | "today_trackers" => Ok(Self::TodayTrackers),
            "completed" | "completed_trackers" => Ok(Self::CompletedTrackers),
            "uncompleted" | "uncompleted_trackers" => Ok(Self::UncompletedTrackers),
            _ => Err(ParseFilterModeError(value.to_string())),
        }
    }
}

/// Which empty-state presentation a query result calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// Nothing scheduled for the day: "what are we going to track?".
    NoTrackers,
    /// A search or completion filter matched nothing.
    NotFound,
    /// Results are present.
    None,
}

impl EmptyState {
    /// Classifies a result set given the narrowing inputs that produced it.
    pub fn classify(is_empty: bool, search_active: bool, filter: FilterMode) -> Self {
        if !is_empty {
            Self::None
        } else if search_active || filter.is_completion_filter() {
            Self::NotFound
        } else {
            Self::NoTrackers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EmptyState, FilterMode};

    #[test]
    fn filter_parses_short_and_long_names() {
        for mode in FilterMode::ALL {
            assert_eq!(mode.as_str().parse::<FilterMode>().unwrap(), mode);
        }
        assert_eq!(
            "Completed".parse::<FilterMode>().unwrap(),
            FilterMode::CompletedTrackers
        );
        assert!("pinned".parse::<FilterMode>().is_err());
    }

    #[test]
    fn empty_state_distinguishes_not_found_from_nothing_scheduled() {
        assert_eq!(
            EmptyState::classify(false, true, FilterMode::CompletedTrackers),
            EmptyState::None
        );
        assert_eq!(
            EmptyState::classify(true, false, FilterMode::AllTrackers),
            EmptyState::NoTrackers
        );
        assert_eq!(
            EmptyState::classify(true, true, FilterMode::TodayTrackers),
            EmptyState::NotFound
        );
        assert_eq!(
            EmptyState::classify(true, false, FilterMode::UncompletedTrackers),
            EmptyState::NotFound
        );
    }
}

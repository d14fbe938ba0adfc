//! Editable tracker state and the "can-submit" gate.
//!
//! # Responsibility
//! - Hold partially filled tracker fields while the user edits them.
//! - Decide whether the save action is enabled.
//! - Produce a validated `Tracker` plus its category title on submit.
//!
//! # Invariants
//! - `can_submit()` is true exactly when `build()` succeeds.
//! - Edit mode keeps the original tracker id.

use crate::model::tracker::{Tracker, TrackerColor, TrackerId, TrackerValidationError};
use crate::model::weekday::Schedule;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Whether the editor creates a new tracker or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEditMode {
    Create,
    Edit {
        tracker: Tracker,
        category_title: String,
    },
}

/// Reason a draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    MissingColor,
    MissingCategory,
    Invalid(TrackerValidationError),
}

impl Display for DraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColor => write!(f, "pick a color"),
            Self::MissingCategory => write!(f, "pick a category"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DraftError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TrackerValidationError> for DraftError {
    fn from(value: TrackerValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Tracker fields as entered so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerDraft {
    id: TrackerId,
    pub title: String,
    pub emoji: String,
    pub color: Option<TrackerColor>,
    pub category_title: Option<String>,
    pub weekdays: Schedule,
}

impl TrackerDraft {
    /// Starts a draft; edit mode pre-fills every field from the tracker.
    pub fn new(mode: &TrackerEditMode) -> Self {
        match mode {
            TrackerEditMode::Create => Self {
                id: Uuid::new_v4(),
                title: String::new(),
                emoji: String::new(),
                color: None,
                category_title: None,
                weekdays: Schedule::new(),
            },
            TrackerEditMode::Edit {
                tracker,
                category_title,
            } => Self {
                id: tracker.id,
                title: tracker.title.clone(),
                emoji: tracker.emoji.clone(),
                color: Some(tracker.color.clone()),
                category_title: Some(category_title.clone()),
                weekdays: tracker.schedule.clone(),
            },
        }
    }

    pub fn id(&self) -> TrackerId {
        self.id
    }

    /// Whether the save action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.build().is_ok()
    }

    /// Validates the draft and returns the tracker with its category title.
    pub fn build(&self) -> Result<(Tracker, String), DraftError> {
        let color = self.color.clone().ok_or(DraftError::MissingColor)?;
        let category_title = self
            .category_title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .ok_or(DraftError::MissingCategory)?
            .to_string();

        let tracker = Tracker::with_id(
            self.id,
            self.title.trim(),
            color,
            self.emoji.clone(),
            self.weekdays.clone(),
        );
        tracker.validate()?;
        Ok((tracker, category_title))
    }
}

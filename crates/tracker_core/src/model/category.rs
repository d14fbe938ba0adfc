//! Category domain model.
//!
//! # Invariants
//! - `id` is the join key between trackers and categories; titles may change.
//! - Titles are trimmed and non-empty, and unique across the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every category.
pub type CategoryId = Uuid;

/// A named grouping of trackers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
}

impl Category {
    /// Creates a category with a generated stable ID.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    pub fn with_id(id: CategoryId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Trims a category title. Returns `None` when nothing is left.
pub fn normalize_category_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

//! Completion record model.
//!
//! # Invariants
//! - At most one record exists per `(tracker_id, day)`; completion is a
//!   boolean per calendar day, not a counter.
//! - Days are stored as ISO `YYYY-MM-DD` text.

use crate::model::tracker::TrackerId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Marks one tracker as done on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub tracker_id: TrackerId,
    pub day: NaiveDate,
}

impl CompletionRecord {
    pub fn new(tracker_id: TrackerId, day: NaiveDate) -> Self {
        Self { tracker_id, day }
    }
}

/// Storage key for a calendar day.
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_KEY_FORMAT).to_string()
}

/// Parses a storage day key. Returns `None` for malformed values.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DAY_KEY_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::{day_key, parse_day_key};
    use chrono::NaiveDate;

    #[test]
    fn day_key_is_zero_padded_iso() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(day_key(day), "2025-03-07");
        assert_eq!(parse_day_key("2025-03-07"), Some(day));
        assert_eq!(parse_day_key("07.03.2025"), None);
    }
}

//! Tracker domain model.
//!
//! # Responsibility
//! - Define the recurring habit record and its color/emoji value types.
//! - Own validation rules shared by the editing gate and repository writes.
//!
//! # Invariants
//! - `id` is stable and never reused for another tracker.
//! - A saved tracker has a non-blank title, one emoji, a `#RRGGBB` color and
//!   at least one scheduled weekday.
//! - Category membership is stored by the repository, not on this value.

use crate::model::weekday::{Schedule, WeekdayType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Stable identifier for every tracker.
pub type TrackerId = Uuid;

/// Upper bound on code points for one emoji (ZWJ family sequences included).
const MAX_EMOJI_CHARS: usize = 10;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9A-Fa-f]{6})$").expect("valid hex color regex"));

/// Validation failure for tracker fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerValidationError {
    EmptyTitle,
    EmptyEmoji,
    InvalidEmoji(String),
    InvalidColor(String),
    EmptySchedule,
}

impl Display for TrackerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "tracker title must not be blank"),
            Self::EmptyEmoji => write!(f, "tracker emoji must not be empty"),
            Self::InvalidEmoji(value) => write!(f, "tracker emoji is not a single symbol: `{value}`"),
            Self::InvalidColor(value) => write!(f, "tracker color must be #RRGGBB, got `{value}`"),
            Self::EmptySchedule => write!(f, "tracker must be scheduled on at least one weekday"),
        }
    }
}

impl Error for TrackerValidationError {}

/// Tracker color, normalized to uppercase `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackerColor(String);

impl TrackerColor {
    /// Parses `#RRGGBB` or `RRGGBB` (any case).
    pub fn from_hex(value: &str) -> Result<Self, TrackerValidationError> {
        let trimmed = value.trim();
        let digits = HEX_COLOR_RE
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| TrackerValidationError::InvalidColor(value.to_string()))?;
        Ok(Self(format!("#{}", digits.as_str().to_ascii_uppercase())))
    }

    /// Builds a color from its components.
    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(format!("#{red:02X}{green:02X}{blue:02X}"))
    }

    /// Persisted hex form, always `#RRGGBB`.
    pub fn hex(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        let channel = |start: usize| u8::from_str_radix(&self.0[start..start + 2], 16).unwrap_or(0);
        (channel(1), channel(3), channel(5))
    }
}

impl TryFrom<String> for TrackerColor {
    type Error = TrackerValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<TrackerColor> for String {
    fn from(value: TrackerColor) -> Self {
        value.0
    }
}

impl Display for TrackerColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-defined recurring habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: TrackerId,
    pub title: String,
    pub color: TrackerColor,
    pub emoji: String,
    /// Weekdays the tracker is due on.
    pub schedule: Schedule,
}

impl Tracker {
    /// Creates a tracker with a generated stable ID.
    pub fn new(
        title: impl Into<String>,
        color: TrackerColor,
        emoji: impl Into<String>,
        schedule: Schedule,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), title, color, emoji, schedule)
    }

    /// Creates a tracker with a caller-provided ID (edit flows, imports).
    pub fn with_id(
        id: TrackerId,
        title: impl Into<String>,
        color: TrackerColor,
        emoji: impl Into<String>,
        schedule: Schedule,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            color,
            emoji: emoji.into(),
            schedule,
        }
    }

    /// Checks the invariants required before persisting.
    pub fn validate(&self) -> Result<(), TrackerValidationError> {
        if self.title.trim().is_empty() {
            return Err(TrackerValidationError::EmptyTitle);
        }
        validate_emoji(&self.emoji)?;
        if self.schedule.is_empty() {
            return Err(TrackerValidationError::EmptySchedule);
        }
        Ok(())
    }

    pub fn is_scheduled_on(&self, weekday: WeekdayType) -> bool {
        self.schedule.contains(&weekday)
    }
}

/// Checks that `emoji` looks like one pictographic symbol.
pub fn validate_emoji(emoji: &str) -> Result<(), TrackerValidationError> {
    if emoji.is_empty() {
        return Err(TrackerValidationError::EmptyEmoji);
    }
    if is_keycap(emoji) {
        return Ok(());
    }
    let looks_like_text = emoji
        .chars()
        .any(|ch| ch.is_whitespace() || ch.is_ascii_alphanumeric());
    if looks_like_text || emoji.chars().count() > MAX_EMOJI_CHARS {
        return Err(TrackerValidationError::InvalidEmoji(emoji.to_string()));
    }
    Ok(())
}

/// `1️⃣`, `#️⃣`: one keycap base, optional VS16, then the combining keycap.
fn is_keycap(emoji: &str) -> bool {
    let mut chars = emoji.chars();
    let base_ok = matches!(chars.next(), Some(base) if base.is_ascii_digit() || base == '#' || base == '*');
    base_ok && matches!(chars.as_str(), "\u{FE0F}\u{20E3}" | "\u{20E3}")
}

/// Search key for a title: lowercase with diacritics removed, so `cafe`
/// finds `Café`.
pub fn fold_title(title: &str) -> String {
    title
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{fold_title, validate_emoji, Tracker, TrackerColor, TrackerValidationError};
    use crate::model::weekday::{Schedule, WeekdayType};

    fn monday_only() -> Schedule {
        [WeekdayType::Monday].into_iter().collect()
    }

    #[test]
    fn color_normalizes_hex_input() {
        let color = TrackerColor::from_hex("33cc66").unwrap();
        assert_eq!(color.hex(), "#33CC66");
        assert_eq!(color.rgb(), (0x33, 0xCC, 0x66));
        assert_eq!(TrackerColor::from_rgb(0x33, 0xCC, 0x66), color);
    }

    #[test]
    fn color_rejects_malformed_hex() {
        for value in ["", "#12345", "#GGGGGG", "#1234567", "red"] {
            assert!(matches!(
                TrackerColor::from_hex(value),
                Err(TrackerValidationError::InvalidColor(_))
            ));
        }
    }

    #[test]
    fn validate_reports_first_broken_field() {
        let color = TrackerColor::from_hex("#FF0000").unwrap();

        let blank = Tracker::new("   ", color.clone(), "🏃", monday_only());
        assert_eq!(blank.validate(), Err(TrackerValidationError::EmptyTitle));

        let no_emoji = Tracker::new("Run", color.clone(), "", monday_only());
        assert_eq!(no_emoji.validate(), Err(TrackerValidationError::EmptyEmoji));

        let text_emoji = Tracker::new("Run", color.clone(), "ab", monday_only());
        assert!(matches!(
            text_emoji.validate(),
            Err(TrackerValidationError::InvalidEmoji(_))
        ));

        let unscheduled = Tracker::new("Run", color.clone(), "🏃", Schedule::new());
        assert_eq!(
            unscheduled.validate(),
            Err(TrackerValidationError::EmptySchedule)
        );

        let valid = Tracker::new("Run", color, "🏃", monday_only());
        assert_eq!(valid.validate(), Ok(()));
        assert!(valid.is_scheduled_on(WeekdayType::Monday));
        assert!(!valid.is_scheduled_on(WeekdayType::Tuesday));
    }

    #[test]
    fn fold_title_handles_non_ascii() {
        assert_eq!(fold_title("ABCdef"), "abcdef");
        assert_eq!(fold_title("Пробежка"), "пробежка");
    }

    #[test]
    fn fold_title_drops_diacritics() {
        assert_eq!(fold_title("Café"), "cafe");
        assert_eq!(fold_title("CAFÉ"), fold_title("cafe"));
        assert_eq!(fold_title("Ёлка Über"), "елка uber");
    }

    #[test]
    fn keycap_emoji_are_accepted_but_bare_digits_are_not() {
        for keycap in ["1\u{FE0F}\u{20E3}", "#\u{FE0F}\u{20E3}", "*\u{20E3}", "0\u{FE0F}\u{20E3}"] {
            assert_eq!(validate_emoji(keycap), Ok(()), "{keycap:?}");
        }
        for text in ["1", "12", "1\u{FE0F}", "a\u{FE0F}\u{20E3}", "1\u{FE0F}\u{20E3}x"] {
            assert!(
                matches!(validate_emoji(text), Err(TrackerValidationError::InvalidEmoji(_))),
                "{text:?}"
            );
        }
    }

    #[test]
    fn tracker_serializes_color_as_hex_string() {
        let tracker = Tracker::new(
            "Read",
            TrackerColor::from_hex("#0A0B0C").unwrap(),
            "📚",
            monday_only(),
        );
        let json = serde_json::to_value(&tracker).unwrap();
        assert_eq!(json["color"], "#0A0B0C");
        assert_eq!(json["schedule"][0], "monday");
    }
}

//! Tracker/completion repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert, delete and query trackers grouped by category.
//! - Own completion toggling and completion counters.
//!
//! # Invariants
//! - Write paths call `Tracker::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Query results are ordered by `category title ASC, tracker title ASC,
//!   tracker uuid ASC`; categories without matching trackers never appear.
//! - At most one completion record exists per `(tracker, day)`.

use crate::db::DbError;
use crate::model::category::{normalize_category_title, Category};
use crate::model::filter::FilterMode;
use crate::model::record::{day_key, parse_day_key, CompletionRecord};
use crate::model::tracker::{fold_title, Tracker, TrackerColor, TrackerId, TrackerValidationError};
use crate::model::weekday::{decode_schedule, encode_schedule, weekday_for};
use crate::repo::category_repo::{find_category_by_title, parse_uuid};
use crate::repo::schema::ensure_table_ready;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TRACKER_SELECT_SQL: &str = "SELECT
    t.uuid AS uuid,
    t.title AS title,
    t.emoji AS emoji,
    t.color AS color,
    t.schedule AS schedule,
    c.uuid AS category_uuid,
    c.title AS category_title
FROM trackers t
INNER JOIN categories c ON c.uuid = t.category_uuid";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by tracker, category and flag persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Tracker value failed domain validation.
    Validation(TrackerValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No category carries the requested title.
    CategoryNotFound(String),
    /// No category carries the requested id.
    UnknownCategory(Uuid),
    /// Category title is blank after trim.
    EmptyCategoryTitle,
    /// Another category already uses this title.
    DuplicateCategoryTitle(String),
    /// Persisted data cannot be converted to a valid domain value.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::CategoryNotFound(title) => write!(f, "category not found: `{title}`"),
            Self::UnknownCategory(id) => write!(f, "category not found: {id}"),
            Self::EmptyCategoryTitle => write!(f, "category title must not be blank"),
            Self::DuplicateCategoryTitle(title) => {
                write!(f, "category title already exists: `{title}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted tracker data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tracker repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tracker repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "tracker repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TrackerValidationError> for RepoError {
    fn from(value: TrackerValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for the tracker list of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerQuery {
    /// Day whose weekday must be in the schedule; also the completion day.
    pub date: NaiveDate,
    /// Case-insensitive title substring. `None` disables the predicate.
    pub search_text: Option<String>,
    pub filter: FilterMode,
}

impl TrackerQuery {
    pub fn new(date: NaiveDate, filter: FilterMode) -> Self {
        Self {
            date,
            search_text: None,
            filter,
        }
    }

    /// Sets the search text. Blank input disables the search predicate.
    pub fn with_search_text(mut self, text: Option<&str>) -> Self {
        self.search_text = text
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        self
    }

    pub fn is_search_active(&self) -> bool {
        self.search_text.is_some()
    }
}

/// Trackers of one category, in title order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSection {
    pub category: Category,
    pub trackers: Vec<Tracker>,
}

/// A tracker together with the category it currently belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerEntry {
    pub tracker: Tracker,
    pub category: Category,
}

/// Repository interface for trackers and their completion records.
pub trait TrackerRepository {
    /// Inserts or replaces a tracker by id and (re)assigns its category.
    fn add_or_update_tracker(&self, tracker: &Tracker, category_title: &str) -> RepoResult<()>;
    /// Deletes a tracker and its records. Returns `false` when nothing matched.
    fn delete_tracker(&self, id: TrackerId) -> RepoResult<bool>;
    fn get_tracker(&self, id: TrackerId) -> RepoResult<Option<TrackerEntry>>;
    fn query_trackers(&self, query: &TrackerQuery) -> RepoResult<Vec<TrackerSection>>;
    /// Flips completion for the calendar day and returns the new state.
    fn toggle_completion(&self, id: TrackerId, date: NaiveDate) -> RepoResult<bool>;
    fn is_completed(&self, id: TrackerId, date: NaiveDate) -> RepoResult<bool>;
    fn completion_count(&self, id: TrackerId) -> RepoResult<u32>;
    fn total_completion_count(&self) -> RepoResult<u32>;
    /// Completion records of one tracker, oldest day first.
    fn completion_records(&self, id: TrackerId) -> RepoResult<Vec<CompletionRecord>>;
}

/// SQLite-backed tracker repository.
pub struct SqliteTrackerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTrackerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "trackers",
            &[
                "uuid",
                "category_uuid",
                "title",
                "title_folded",
                "emoji",
                "color",
                "schedule",
            ],
        )?;
        ensure_table_ready(conn, "completion_records", &["tracker_uuid", "completed_on"])?;
        Ok(Self { conn })
    }
}

impl TrackerRepository for SqliteTrackerRepository<'_> {
    fn add_or_update_tracker(&self, tracker: &Tracker, category_title: &str) -> RepoResult<()> {
        tracker.validate()?;

        let title = normalize_category_title(category_title)
            .ok_or_else(|| RepoError::CategoryNotFound(category_title.to_string()))?;
        let category = find_category_by_title(self.conn, &title)?
            .ok_or(RepoError::CategoryNotFound(title))?;

        self.conn.execute(
            "INSERT INTO trackers (
                uuid,
                category_uuid,
                title,
                title_folded,
                emoji,
                color,
                schedule
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(uuid) DO UPDATE SET
                category_uuid = excluded.category_uuid,
                title = excluded.title,
                title_folded = excluded.title_folded,
                emoji = excluded.emoji,
                color = excluded.color,
                schedule = excluded.schedule,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                tracker.id.to_string(),
                category.id.to_string(),
                tracker.title.as_str(),
                fold_title(&tracker.title),
                tracker.emoji.as_str(),
                tracker.color.hex(),
                encode_schedule(&tracker.schedule),
            ],
        )?;

        Ok(())
    }

    fn delete_tracker(&self, id: TrackerId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM trackers WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn get_tracker(&self, id: TrackerId) -> RepoResult<Option<TrackerEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TRACKER_SELECT_SQL} WHERE t.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let (tracker, category) = parse_tracker_row(row)?;
            return Ok(Some(TrackerEntry { tracker, category }));
        }
        Ok(None)
    }

    fn query_trackers(&self, query: &TrackerQuery) -> RepoResult<Vec<TrackerSection>> {
        let weekday = weekday_for(query.date);
        let mut sql = format!("{TRACKER_SELECT_SQL} WHERE instr(t.schedule, ?) > 0");
        let mut bind_values: Vec<Value> = vec![Value::Text(weekday.code().to_string())];

        if let Some(search) = query.search_text.as_deref() {
            sql.push_str(" AND instr(t.title_folded, ?) > 0");
            bind_values.push(Value::Text(fold_title(search)));
        }

        let completed_exists = "EXISTS (
            SELECT 1
            FROM completion_records r
            WHERE r.tracker_uuid = t.uuid
              AND r.completed_on = ?
        )";
        match query.filter {
            FilterMode::AllTrackers | FilterMode::TodayTrackers => {}
            FilterMode::CompletedTrackers => {
                sql.push_str(&format!(" AND {completed_exists}"));
                bind_values.push(Value::Text(day_key(query.date)));
            }
            FilterMode::UncompletedTrackers => {
                sql.push_str(&format!(" AND NOT {completed_exists}"));
                bind_values.push(Value::Text(day_key(query.date)));
            }
        }

        sql.push_str(" ORDER BY c.title ASC, t.title ASC, t.uuid ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut sections: Vec<TrackerSection> = Vec::new();
        while let Some(row) = rows.next()? {
            let (tracker, category) = parse_tracker_row(row)?;
            match sections.last_mut() {
                Some(section) if section.category.id == category.id => {
                    section.trackers.push(tracker);
                }
                _ => sections.push(TrackerSection {
                    category,
                    trackers: vec![tracker],
                }),
            }
        }

        Ok(sections)
    }

    fn toggle_completion(&self, id: TrackerId, date: NaiveDate) -> RepoResult<bool> {
        let tracker_uuid = id.to_string();
        let day = day_key(date);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !tracker_exists(&tx, &tracker_uuid)? {
            return Ok(false);
        }

        let removed = tx.execute(
            "DELETE FROM completion_records
             WHERE tracker_uuid = ?1
               AND completed_on = ?2;",
            params![tracker_uuid, day],
        )?;
        let completed = if removed == 0 {
            tx.execute(
                "INSERT INTO completion_records (tracker_uuid, completed_on)
                 VALUES (?1, ?2);",
                params![tracker_uuid, day],
            )?;
            true
        } else {
            false
        };

        tx.commit()?;
        Ok(completed)
    }

    fn is_completed(&self, id: TrackerId, date: NaiveDate) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM completion_records
                WHERE tracker_uuid = ?1
                  AND completed_on = ?2
            );",
            params![id.to_string(), day_key(date)],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn completion_count(&self, id: TrackerId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM completion_records WHERE tracker_uuid = ?1;",
            [id.to_string()],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    fn total_completion_count(&self) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM completion_records;",
            [],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    fn completion_records(&self, id: TrackerId) -> RepoResult<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT completed_on
             FROM completion_records
             WHERE tracker_uuid = ?1
             ORDER BY completed_on ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("completed_on")?;
            let day = parse_day_key(&value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid day `{value}` in completion_records.completed_on"
                ))
            })?;
            records.push(CompletionRecord::new(id, day));
        }
        Ok(records)
    }
}

fn parse_tracker_row(row: &Row<'_>) -> RepoResult<(Tracker, Category)> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "trackers.uuid")?;

    let color_text: String = row.get("color")?;
    let color = TrackerColor::from_hex(&color_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid color `{color_text}` in trackers.color"))
    })?;

    let schedule_text: String = row.get("schedule")?;
    let schedule = decode_schedule(&schedule_text).map_err(|code| {
        RepoError::InvalidData(format!(
            "invalid weekday code `{code}` in trackers.schedule `{schedule_text}`"
        ))
    })?;

    let tracker = Tracker {
        id,
        title: row.get("title")?,
        color,
        emoji: row.get("emoji")?,
        schedule,
    };
    tracker.validate().map_err(|err| {
        RepoError::InvalidData(format!("tracker {id} violates invariants: {err}"))
    })?;

    let category_uuid: String = row.get("category_uuid")?;
    let category = Category {
        id: parse_uuid(&category_uuid, "categories.uuid")?,
        title: row.get("category_title")?,
    };

    Ok((tracker, category))
}

fn tracker_exists(conn: &Connection, tracker_uuid: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM trackers WHERE uuid = ?1);",
        [tracker_uuid],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

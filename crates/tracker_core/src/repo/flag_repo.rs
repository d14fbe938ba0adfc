//! Local boolean flag store.
//!
//! Keys that were never written read as `false`.

use crate::repo::schema::ensure_table_ready;
use crate::repo::tracker_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for persisted boolean flags.
pub trait FlagRepository {
    fn get_flag(&self, key: &str) -> RepoResult<bool>;
    fn set_flag(&self, key: &str, value: bool) -> RepoResult<()>;
}

/// SQLite-backed flag repository over `app_flags`.
pub struct SqliteFlagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFlagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "app_flags", &["key", "value"])?;
        Ok(Self { conn })
    }
}

impl FlagRepository for SqliteFlagRepository<'_> {
    fn get_flag(&self, key: &str) -> RepoResult<bool> {
        let value: Option<i64> = self
            .conn
            .query_row("SELECT value FROM app_flags WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match value {
            None | Some(0) => Ok(false),
            Some(1) => Ok(true),
            Some(other) => Err(RepoError::InvalidData(format!(
                "invalid flag value `{other}` for key `{key}` in app_flags.value"
            ))),
        }
    }

    fn set_flag(&self, key: &str, value: bool) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO app_flags (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, i64::from(value)],
        )?;
        Ok(())
    }
}

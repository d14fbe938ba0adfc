//! Schema upgrade steps for the tracker store.
//!
//! # Responsibility
//! - List every upgrade step, SQL or Rust, in version order.
//! - Run the pending steps inside one transaction.
//!
//! # Invariants
//! - Versions are strictly increasing, starting at 1.
//! - `PRAGMA user_version` moves only when every pending step succeeded.

use crate::db::{DbError, DbResult};
use crate::model::tracker::fold_title;
use log::{debug, info};
use rusqlite::{Connection, Transaction};

enum Step {
    Sql(&'static str),
    Rust(fn(&Transaction<'_>) -> rusqlite::Result<()>),
}

struct Migration {
    version: u32,
    name: &'static str,
    step: Step,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        step: Step::Sql(include_str!("0001_init.sql")),
    },
    Migration {
        version: 2,
        name: "app_flags",
        step: Step::Sql(include_str!("0002_app_flags.sql")),
    },
    Migration {
        version: 3,
        name: "refold_titles",
        step: Step::Rust(refold_titles),
    },
];

/// Schema version produced by the newest step.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings `conn` up to [`latest_version`].
///
/// A failing step rolls back every step of this run and is reported as
/// [`DbError::Migration`] with its version.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew {
            location: None,
            found,
            supported,
        });
    }
    if found == supported {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|migration| migration.version > found) {
        run_step(&tx, migration).map_err(|source| DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={supported}");
    Ok(())
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn run_step(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    match migration.step {
        Step::Sql(sql) => tx.execute_batch(sql)?,
        Step::Rust(step) => step(tx)?,
    }
    tx.pragma_update(None, "user_version", migration.version)
}

/// Recomputes `trackers.title_folded` after the folding rule started to
/// drop diacritics.
fn refold_titles(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let titles = {
        let mut stmt = tx.prepare("SELECT uuid, title FROM trackers;")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let titles = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        titles
    };
    let mut update = tx.prepare("UPDATE trackers SET title_folded = ?1 WHERE uuid = ?2;")?;
    for (uuid, title) in titles {
        update.execute([fold_title(&title), uuid])?;
    }
    Ok(())
}

//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, rename and list categories.
//! - Resolve category titles to stable ids for tracker writes.
//!
//! # Invariants
//! - Titles are trimmed, non-empty and unique.
//! - Categories are never deleted implicitly.
//! - Rename keeps the id, so tracker membership survives it.

use crate::model::category::{normalize_category_title, Category, CategoryId};
use crate::repo::schema::ensure_table_ready;
use crate::repo::tracker_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// Repository interface for categories.
pub trait CategoryRepository {
    fn create_category(&self, title: &str) -> RepoResult<Category>;
    fn rename_category(&self, id: CategoryId, title: &str) -> RepoResult<Category>;
    fn get_category_by_title(&self, title: &str) -> RepoResult<Option<Category>>;
    /// All categories sorted by title.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    /// Number of trackers currently assigned to the category.
    fn tracker_count(&self, id: CategoryId) -> RepoResult<u32>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "categories", &["uuid", "title"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, title: &str) -> RepoResult<Category> {
        let title = normalize_category_title(title).ok_or(RepoError::EmptyCategoryTitle)?;
        if find_category_by_title(self.conn, &title)?.is_some() {
            return Err(RepoError::DuplicateCategoryTitle(title));
        }

        let category = Category::new(title);
        self.conn.execute(
            "INSERT INTO categories (uuid, title) VALUES (?1, ?2);",
            params![category.id.to_string(), category.title.as_str()],
        )?;
        Ok(category)
    }

    fn rename_category(&self, id: CategoryId, title: &str) -> RepoResult<Category> {
        let title = normalize_category_title(title).ok_or(RepoError::EmptyCategoryTitle)?;
        if let Some(existing) = find_category_by_title(self.conn, &title)? {
            if existing.id == id {
                return Ok(existing);
            }
            return Err(RepoError::DuplicateCategoryTitle(title));
        }

        let changed = self.conn.execute(
            "UPDATE categories
             SET
                title = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), title.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::UnknownCategory(id));
        }
        Ok(Category::with_id(id, title))
    }

    fn get_category_by_title(&self, title: &str) -> RepoResult<Option<Category>> {
        match normalize_category_title(title) {
            Some(title) => find_category_by_title(self.conn, &title),
            None => Ok(None),
        }
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, title FROM categories ORDER BY title ASC, uuid ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            categories.push(Category {
                id: parse_uuid(&uuid_text, "categories.uuid")?,
                title: row.get("title")?,
            });
        }
        Ok(categories)
    }

    fn tracker_count(&self, id: CategoryId) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM trackers WHERE category_uuid = ?1;",
            [id.to_string()],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }
}

/// Looks up a category by its already-normalized title.
pub(crate) fn find_category_by_title(
    conn: &Connection,
    title: &str,
) -> RepoResult<Option<Category>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT uuid, title FROM categories WHERE title = ?1;",
            [title],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match row {
        Some((uuid_text, title)) => Ok(Some(Category {
            id: parse_uuid(&uuid_text, "categories.uuid")?,
            title,
        })),
        None => Ok(None),
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

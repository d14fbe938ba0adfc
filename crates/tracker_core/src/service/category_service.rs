//! Category list service.
//!
//! # Responsibility
//! - Create and rename categories.
//! - Publish the title-sorted category list as a single-section live list.
//!
//! # Invariants
//! - The first `categories()` call is announced as a reload; later writes
//!   as itemized batches.

use crate::diff::{ChangeEvent, Keyed, LiveQuery, Section, Subscription};
use crate::model::category::{Category, CategoryId};
use crate::repo::category_repo::CategoryRepository;
use crate::service::tracker_service::ServiceResult;
use log::info;

impl Keyed for () {
    type Key = ();

    fn key(&self) -> Self::Key {}
}

pub struct CategoryDataProvider<R: CategoryRepository> {
    repo: R,
    live: LiveQuery<(), Category>,
    loaded: bool,
}

impl<R: CategoryRepository> CategoryDataProvider<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            live: LiveQuery::new(),
            loaded: false,
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.live.subscribe(callback)
    }

    /// All categories sorted by title.
    pub fn categories(&mut self) -> ServiceResult<Vec<Category>> {
        let sections = self.load()?;
        if self.loaded {
            self.live.apply_mutation(sections)?;
        } else {
            self.live.replace(sections);
            self.loaded = true;
        }
        Ok(self
            .live
            .snapshot()
            .first()
            .map(|section| section.items.clone())
            .unwrap_or_default())
    }

    pub fn is_empty(&self) -> ServiceResult<bool> {
        Ok(self.repo.list_categories()?.is_empty())
    }

    /// Creates a category from a trimmed, unique, non-blank title.
    pub fn create_category(&mut self, title: &str) -> ServiceResult<Category> {
        let category = self.repo.create_category(title)?;
        info!(
            "event=category_create module=service status=ok category_id={}",
            category.id
        );
        self.refresh()?;
        Ok(category)
    }

    /// Renames a category; its trackers stay attached.
    pub fn rename_category(&mut self, id: CategoryId, title: &str) -> ServiceResult<Category> {
        let category = self.repo.rename_category(id, title)?;
        info!("event=category_rename module=service status=ok category_id={id}");
        self.refresh()?;
        Ok(category)
    }

    pub fn tracker_count(&self, id: CategoryId) -> ServiceResult<u32> {
        Ok(self.repo.tracker_count(id)?)
    }

    fn refresh(&mut self) -> ServiceResult<()> {
        if self.loaded {
            let sections = self.load()?;
            self.live.apply_mutation(sections)?;
        }
        Ok(())
    }

    fn load(&self) -> ServiceResult<Vec<Section<(), Category>>> {
        let categories = self.repo.list_categories()?;
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Section::new((), categories)])
    }
}

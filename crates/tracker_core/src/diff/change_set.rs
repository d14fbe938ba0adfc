//! Batched structural change description for sectioned lists.
//!
//! # Responsibility
//! - Describe one mutation cycle as inserted/deleted sections and
//!   inserted/deleted/updated/moved item positions.
//! - Define the order a consumer must apply those changes in, and simulate
//!   that application against a snapshot.
//!
//! # Invariants
//! - Deleted sections, deleted items, updated items and move sources address
//!   the pre-mutation snapshot.
//! - Inserted sections, inserted items and move destinations address the
//!   post-mutation snapshot.
//! - Application order: deletions (sections, then items) → insertions
//!   (sections, then items) → updates → moves.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Position of one item inside a sectioned list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct IndexPath {
    pub section: usize,
    pub item: usize,
}

impl IndexPath {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl Display for IndexPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

/// One item moving from an old position to a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemMove {
    pub from: IndexPath,
    pub to: IndexPath,
}

/// A single change in application order, as yielded by [`ChangeSet::steps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStep {
    DeleteSection(usize),
    DeleteItem(IndexPath),
    InsertSection(usize),
    InsertItem(IndexPath),
    UpdateItem(IndexPath),
    MoveItem(ItemMove),
}

/// Changes produced by one mutation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    pub inserted_sections: BTreeSet<usize>,
    pub deleted_sections: BTreeSet<usize>,
    pub inserted_items: BTreeSet<IndexPath>,
    pub deleted_items: BTreeSet<IndexPath>,
    pub updated_items: BTreeSet<IndexPath>,
    pub moved_items: BTreeSet<ItemMove>,
}

/// A change set that cannot be applied to the given snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetError {
    SectionOutOfRange {
        index: usize,
        len: usize,
    },
    ItemOutOfRange {
        path: IndexPath,
        len: usize,
    },
    /// The same position is addressed twice within one phase.
    DuplicatePosition(IndexPath),
    /// An item change addresses a section that is itself deleted or inserted.
    ItemInChangedSection(IndexPath),
    /// An update addresses an item that is deleted or moved away.
    UpdateOfRemovedItem(IndexPath),
    SectionCountMismatch {
        expected: usize,
        actual: usize,
    },
    ItemCountMismatch {
        section: usize,
        expected: usize,
        actual: usize,
    },
}

impl Display for ChangeSetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionOutOfRange { index, len } => {
                write!(f, "section {index} out of range for {len} sections")
            }
            Self::ItemOutOfRange { path, len } => {
                write!(f, "item {path} out of range for {len} items")
            }
            Self::DuplicatePosition(path) => write!(f, "position {path} addressed twice"),
            Self::ItemInChangedSection(path) => {
                write!(f, "item {path} lies in an inserted or deleted section")
            }
            Self::UpdateOfRemovedItem(path) => {
                write!(f, "item {path} is updated after being removed")
            }
            Self::SectionCountMismatch { expected, actual } => write!(
                f,
                "invalid number of sections: expected {expected}, change set yields {actual}"
            ),
            Self::ItemCountMismatch {
                section,
                expected,
                actual,
            } => write!(
                f,
                "invalid number of items in section {section}: expected {expected}, change set yields {actual}"
            ),
        }
    }
}

impl Error for ChangeSetError {}

struct Slot<T> {
    origin: Option<IndexPath>,
    value: T,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserted_sections.is_empty()
            && self.deleted_sections.is_empty()
            && self.inserted_items.is_empty()
            && self.deleted_items.is_empty()
            && self.updated_items.is_empty()
            && self.moved_items.is_empty()
    }

    /// Total number of recorded changes.
    pub fn len(&self) -> usize {
        self.inserted_sections.len()
            + self.deleted_sections.len()
            + self.inserted_items.len()
            + self.deleted_items.len()
            + self.updated_items.len()
            + self.moved_items.len()
    }

    /// Lists every change in the order a consumer must apply them.
    ///
    /// Deletions run from the highest index down so that earlier removals
    /// never shift positions that are still pending.
    pub fn steps(&self) -> Vec<ChangeStep> {
        let mut steps = Vec::with_capacity(self.len());
        steps.extend(
            self.deleted_sections
                .iter()
                .rev()
                .map(|&index| ChangeStep::DeleteSection(index)),
        );
        steps.extend(
            self.deleted_items
                .iter()
                .rev()
                .map(|&path| ChangeStep::DeleteItem(path)),
        );
        steps.extend(
            self.inserted_sections
                .iter()
                .map(|&index| ChangeStep::InsertSection(index)),
        );
        steps.extend(
            self.inserted_items
                .iter()
                .map(|&path| ChangeStep::InsertItem(path)),
        );
        steps.extend(
            self.updated_items
                .iter()
                .map(|&path| ChangeStep::UpdateItem(path)),
        );
        steps.extend(self.moved_items.iter().map(|&mv| ChangeStep::MoveItem(mv)));
        steps
    }

    /// Applies this change set to `old` the way an indexed list view would.
    ///
    /// `new` plays the role of the already-updated data source: inserted,
    /// updated and moved items take their values from it. Fails when any
    /// index is out of range or the resulting shape differs from `new`.
    pub fn apply<T: Clone>(
        &self,
        old: &[Vec<T>],
        new: &[Vec<T>],
    ) -> Result<Vec<Vec<T>>, ChangeSetError> {
        let survivors = self.remove_from(old)?;
        let mut sections = self.insert_into(survivors, new)?;

        for (section_index, section) in sections.iter_mut().enumerate() {
            for (item_index, slot) in section.iter_mut().enumerate() {
                let Some(origin) = slot.origin else { continue };
                if self.updated_items.contains(&origin) {
                    let path = IndexPath::new(section_index, item_index);
                    slot.value = lookup(new, path)?.clone();
                }
            }
        }

        if sections.len() != new.len() {
            return Err(ChangeSetError::SectionCountMismatch {
                expected: new.len(),
                actual: sections.len(),
            });
        }
        for (index, (section, expected)) in sections.iter().zip(new).enumerate() {
            if section.len() != expected.len() {
                return Err(ChangeSetError::ItemCountMismatch {
                    section: index,
                    expected: expected.len(),
                    actual: section.len(),
                });
            }
        }

        Ok(sections
            .into_iter()
            .map(|section| section.into_iter().map(|slot| slot.value).collect())
            .collect())
    }

    /// Deletion phase: drops deleted sections, deleted items and move sources.
    fn remove_from<T: Clone>(&self, old: &[Vec<T>]) -> Result<Vec<Vec<Slot<T>>>, ChangeSetError> {
        for &index in &self.deleted_sections {
            if index >= old.len() {
                return Err(ChangeSetError::SectionOutOfRange {
                    index,
                    len: old.len(),
                });
            }
        }

        let mut removed: HashSet<IndexPath> = HashSet::new();
        let sources = self
            .deleted_items
            .iter()
            .chain(self.moved_items.iter().map(|mv| &mv.from));
        for &path in sources {
            self.check_old_item(old, path)?;
            if !removed.insert(path) {
                return Err(ChangeSetError::DuplicatePosition(path));
            }
        }
        for &path in &self.updated_items {
            self.check_old_item(old, path)?;
            if removed.contains(&path) {
                return Err(ChangeSetError::UpdateOfRemovedItem(path));
            }
        }

        Ok(old
            .iter()
            .enumerate()
            .filter(|(section, _)| !self.deleted_sections.contains(section))
            .map(|(section, items)| {
                items
                    .iter()
                    .enumerate()
                    .map(|(item, value)| (IndexPath::new(section, item), value))
                    .filter(|(path, _)| !removed.contains(path))
                    .map(|(path, value)| Slot {
                        origin: Some(path),
                        value: value.clone(),
                    })
                    .collect()
            })
            .collect())
    }

    /// Insertion phase: places inserted sections, inserted items and move
    /// destinations; survivors fill the remaining positions in order.
    fn insert_into<T: Clone>(
        &self,
        survivors: Vec<Vec<Slot<T>>>,
        new: &[Vec<T>],
    ) -> Result<Vec<Vec<Slot<T>>>, ChangeSetError> {
        let section_count = survivors.len() + self.inserted_sections.len();
        if let Some(&index) = self.inserted_sections.iter().next_back() {
            if index >= section_count {
                return Err(ChangeSetError::SectionOutOfRange {
                    index,
                    len: section_count,
                });
            }
        }

        let mut surviving = survivors.into_iter();
        let mut sections = Vec::with_capacity(section_count);
        for index in 0..section_count {
            if self.inserted_sections.contains(&index) {
                let items = new.get(index).ok_or(ChangeSetError::SectionOutOfRange {
                    index,
                    len: new.len(),
                })?;
                sections.push(
                    items
                        .iter()
                        .map(|value| Slot {
                            origin: None,
                            value: value.clone(),
                        })
                        .collect(),
                );
            } else {
                sections.push(surviving.next().unwrap_or_default());
            }
        }

        let mut incoming: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
        let destinations = self
            .inserted_items
            .iter()
            .chain(self.moved_items.iter().map(|mv| &mv.to));
        for &path in destinations {
            if path.section >= section_count {
                return Err(ChangeSetError::SectionOutOfRange {
                    index: path.section,
                    len: section_count,
                });
            }
            if self.inserted_sections.contains(&path.section) {
                return Err(ChangeSetError::ItemInChangedSection(path));
            }
            if !incoming.entry(path.section).or_default().insert(path.item) {
                return Err(ChangeSetError::DuplicatePosition(path));
            }
        }

        for (section, slots) in incoming {
            let base = std::mem::take(&mut sections[section]);
            let len = base.len() + slots.len();
            if let Some(&item) = slots.iter().next_back() {
                if item >= len {
                    return Err(ChangeSetError::ItemOutOfRange {
                        path: IndexPath::new(section, item),
                        len,
                    });
                }
            }

            let mut base = base.into_iter();
            let mut merged = Vec::with_capacity(len);
            for item in 0..len {
                if slots.contains(&item) {
                    let value = lookup(new, IndexPath::new(section, item))?.clone();
                    merged.push(Slot {
                        origin: None,
                        value,
                    });
                } else if let Some(slot) = base.next() {
                    merged.push(slot);
                }
            }
            sections[section] = merged;
        }

        Ok(sections)
    }

    fn check_old_item<T>(&self, old: &[Vec<T>], path: IndexPath) -> Result<(), ChangeSetError> {
        if self.deleted_sections.contains(&path.section) {
            return Err(ChangeSetError::ItemInChangedSection(path));
        }
        let items = old.get(path.section).ok_or(ChangeSetError::SectionOutOfRange {
            index: path.section,
            len: old.len(),
        })?;
        if path.item >= items.len() {
            return Err(ChangeSetError::ItemOutOfRange {
                path,
                len: items.len(),
            });
        }
        Ok(())
    }
}

fn lookup<T>(sections: &[Vec<T>], path: IndexPath) -> Result<&T, ChangeSetError> {
    let items = sections
        .get(path.section)
        .ok_or(ChangeSetError::SectionOutOfRange {
            index: path.section,
            len: sections.len(),
        })?;
    items.get(path.item).ok_or(ChangeSetError::ItemOutOfRange {
        path,
        len: items.len(),
    })
}

//! Keyed diff between two sectioned snapshots.
//!
//! # Responsibility
//! - Turn a previous and a new ordered snapshot into a [`ChangeSet`].
//!
//! # Invariants
//! - Section keys are unique within a snapshot; item keys are unique across
//!   the whole snapshot.
//! - A section whose header value changed, or that lost its relative order,
//!   is reported as delete + insert. Items inside deleted or inserted
//!   sections are covered by the section change.
//! - Items that keep their relative order within a surviving section stay
//!   put (longest common subsequence); every other surviving item is a move.
//! - Only stationary items are reported as updated; a move already carries
//!   the new value.
//! - Applying the result to the old snapshot reproduces the new one.

use crate::diff::change_set::{ChangeSet, IndexPath, ItemMove};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// A value with a stable identity used to match it across snapshots.
pub trait Keyed {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> Self::Key;
}

/// One section of a snapshot: a header value plus its ordered items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<S, I> {
    pub header: S,
    pub items: Vec<I>,
}

impl<S, I> Section<S, I> {
    pub fn new(header: S, items: Vec<I>) -> Self {
        Self { header, items }
    }
}

/// Computes the change set that turns `old` into `new`.
pub fn diff_sections<S, I>(old: &[Section<S, I>], new: &[Section<S, I>]) -> ChangeSet
where
    S: Keyed + PartialEq,
    I: Keyed + PartialEq,
{
    let mut changes = ChangeSet::default();

    // Sections that exist on both sides with an unchanged header are
    // candidates; only the ones in common relative order survive.
    let new_headers: HashMap<S::Key, &S> = new
        .iter()
        .map(|section| (section.header.key(), &section.header))
        .collect();
    let old_candidates: Vec<S::Key> = old
        .iter()
        .filter(|section| {
            new_headers
                .get(&section.header.key())
                .is_some_and(|header| **header == section.header)
        })
        .map(|section| section.header.key())
        .collect();
    let candidate_set: HashSet<&S::Key> = old_candidates.iter().collect();
    let new_candidates: Vec<S::Key> = new
        .iter()
        .map(|section| section.header.key())
        .filter(|key| candidate_set.contains(key))
        .collect();
    let surviving_sections = longest_common_keys(&old_candidates, &new_candidates);

    let mut section_pairs: HashMap<usize, usize> = HashMap::new();
    let new_section_index: HashMap<S::Key, usize> = new
        .iter()
        .enumerate()
        .map(|(index, section)| (section.header.key(), index))
        .collect();
    for (old_index, section) in old.iter().enumerate() {
        let key = section.header.key();
        if surviving_sections.contains(&key) {
            if let Some(&new_index) = new_section_index.get(&key) {
                section_pairs.insert(old_index, new_index);
            }
        } else {
            changes.deleted_sections.insert(old_index);
        }
    }
    let paired_new: HashSet<usize> = section_pairs.values().copied().collect();
    for new_index in 0..new.len() {
        if !paired_new.contains(&new_index) {
            changes.inserted_sections.insert(new_index);
        }
    }

    // Item positions restricted to surviving sections.
    let old_positions = item_positions(old, |index| section_pairs.contains_key(&index));
    let new_positions = item_positions(new, |index| paired_new.contains(&index));

    for (key, (old_path, _)) in &old_positions {
        if !new_positions.contains_key(key) {
            changes.deleted_items.insert(*old_path);
        }
    }
    for (key, (new_path, _)) in &new_positions {
        if !old_positions.contains_key(key) {
            changes.inserted_items.insert(*new_path);
        }
    }

    for (&old_index, &new_index) in &section_pairs {
        let old_order: Vec<I::Key> = old[old_index]
            .items
            .iter()
            .map(Keyed::key)
            .filter(|key| lives_in(&new_positions, key, new_index))
            .collect();
        let new_order: Vec<I::Key> = new[new_index]
            .items
            .iter()
            .map(Keyed::key)
            .filter(|key| lives_in(&old_positions, key, old_index))
            .collect();
        let stationary = longest_common_keys(&old_order, &new_order);

        for key in &old_order {
            let (Some((old_path, old_item)), Some((new_path, new_item))) =
                (old_positions.get(key), new_positions.get(key))
            else {
                continue;
            };
            if stationary.contains(key) {
                if old_item != new_item {
                    changes.updated_items.insert(*old_path);
                }
            } else {
                changes.moved_items.insert(ItemMove {
                    from: *old_path,
                    to: *new_path,
                });
            }
        }
    }

    // Items crossing between two surviving sections.
    for (key, (old_path, _)) in &old_positions {
        let Some((new_path, _)) = new_positions.get(key) else {
            continue;
        };
        let paired = section_pairs.get(&old_path.section).copied();
        if paired != Some(new_path.section) {
            changes.moved_items.insert(ItemMove {
                from: *old_path,
                to: *new_path,
            });
        }
    }

    changes
}

fn item_positions<S, I>(
    sections: &[Section<S, I>],
    include: impl Fn(usize) -> bool,
) -> HashMap<I::Key, (IndexPath, &I)>
where
    I: Keyed,
{
    sections
        .iter()
        .enumerate()
        .filter(|(index, _)| include(*index))
        .flat_map(|(section_index, section)| {
            section
                .items
                .iter()
                .enumerate()
                .map(move |(item_index, item)| {
                    (item.key(), (IndexPath::new(section_index, item_index), item))
                })
        })
        .collect()
}

fn lives_in<K: Eq + Hash, I>(
    positions: &HashMap<K, (IndexPath, &I)>,
    key: &K,
    section: usize,
) -> bool {
    positions
        .get(key)
        .is_some_and(|(path, _)| path.section == section)
}

/// Keys of one longest common subsequence of `a` and `b`.
fn longest_common_keys<K: Clone + Eq + Hash>(a: &[K], b: &[K]) -> HashSet<K> {
    let rows = a.len();
    let cols = b.len();
    let mut lengths = vec![vec![0usize; cols + 1]; rows + 1];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            lengths[i][j] = if a[i] == b[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut common = HashSet::new();
    let (mut i, mut j) = (0, 0);
    while i < rows && j < cols {
        if a[i] == b[j] {
            common.insert(a[i].clone());
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    common
}

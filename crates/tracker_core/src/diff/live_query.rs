//! Last delivered snapshot plus the notifier that reports its changes.

use crate::diff::change_set::ChangeStep;
use crate::diff::compute::{diff_sections, Keyed, Section};
use crate::diff::notifier::{
    ChangeEvent, ChangeNotifier, ItemChange, NotifierError, SectionChange, Subscription,
};

/// A sectioned query result kept in sync with its subscriber.
pub struct LiveQuery<S, I> {
    snapshot: Vec<Section<S, I>>,
    notifier: ChangeNotifier,
}

impl<S, I> Default for LiveQuery<S, I> {
    fn default() -> Self {
        Self {
            snapshot: Vec::new(),
            notifier: ChangeNotifier::new(),
        }
    }
}

impl<S, I> LiveQuery<S, I>
where
    S: Keyed + PartialEq,
    I: Keyed + PartialEq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &[Section<S, I>] {
        &self.snapshot
    }

    pub fn subscribe(&self, callback: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.notifier.subscribe(callback)
    }

    /// Swaps in a snapshot from a reconfigured query and signals a reload.
    pub fn replace(&mut self, snapshot: Vec<Section<S, I>>) {
        self.snapshot = snapshot;
        self.notifier.reload();
    }

    /// Swaps in a snapshot of the same query and reports the itemized diff.
    ///
    /// Returns `Ok(false)` without dispatching when nothing changed.
    pub fn apply_mutation(&mut self, snapshot: Vec<Section<S, I>>) -> Result<bool, NotifierError> {
        let changes = diff_sections(&self.snapshot, &snapshot);
        self.snapshot = snapshot;
        if changes.is_empty() {
            return Ok(false);
        }

        self.notifier.will_change();
        for step in changes.steps() {
            match step {
                ChangeStep::DeleteSection(index) => {
                    self.notifier.record_section(index, SectionChange::Delete)?
                }
                ChangeStep::InsertSection(index) => {
                    self.notifier.record_section(index, SectionChange::Insert)?
                }
                ChangeStep::DeleteItem(path) => self.notifier.record_item(ItemChange::Delete(path))?,
                ChangeStep::InsertItem(path) => self.notifier.record_item(ItemChange::Insert(path))?,
                ChangeStep::UpdateItem(path) => self.notifier.record_item(ItemChange::Update(path))?,
                ChangeStep::MoveItem(item_move) => self.notifier.record_item(ItemChange::Move {
                    from: item_move.from,
                    to: item_move.to,
                })?,
            }
        }
        self.notifier.did_change()?;
        Ok(true)
    }
}

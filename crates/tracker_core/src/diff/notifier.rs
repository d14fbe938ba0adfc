//! Change notifier state machine and single-subscriber registration.
//!
//! # Responsibility
//! - Accumulate section and item changes between `will_change` and
//!   `did_change`, then deliver them as one [`ChangeEvent`].
//! - Hold at most one subscriber callback.
//!
//! # Invariants
//! - Changes can only be recorded while accumulating.
//! - A new subscription replaces the previous one (last write wins).
//! - Dropping a [`Subscription`] only unsubscribes if it is still current.
//! - The subscriber slot is never borrowed while a callback runs, so a
//!   callback may subscribe or cancel re-entrantly.

use crate::diff::change_set::{ChangeSet, IndexPath, ItemMove};
use log::debug;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

/// Event delivered to the subscriber after a mutation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Query parameters changed; discard and reload everything.
    Reload,
    Batch(ChangeSet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionChange {
    Insert,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Insert(IndexPath),
    Delete(IndexPath),
    Update(IndexPath),
    Move { from: IndexPath, to: IndexPath },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierError {
    /// A record or `did_change` call arrived outside a mutation cycle.
    NotAccumulating,
}

impl Display for NotifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAccumulating => write!(f, "change notifier is not accumulating a batch"),
        }
    }
}

impl Error for NotifierError {}

type Callback = Box<dyn FnMut(&ChangeEvent)>;

#[derive(Default)]
struct SubscriberSlot {
    active: Option<u64>,
    callback: Option<Callback>,
    next_token: u64,
}

#[derive(Debug, Default)]
enum NotifierState {
    #[default]
    Idle,
    Accumulating(ChangeSet),
}

/// Idle/Accumulating state machine that reports batched changes.
#[derive(Default)]
pub struct ChangeNotifier {
    state: NotifierState,
    slot: Rc<RefCell<SubscriberSlot>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, NotifierState::Accumulating(_))
    }

    pub fn has_subscriber(&self) -> bool {
        self.slot.borrow().active.is_some()
    }

    /// Registers `callback` as the only subscriber.
    pub fn subscribe(&self, callback: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        let (token, replaced) = {
            let mut slot = self.slot.borrow_mut();
            let token = slot.next_token;
            slot.next_token += 1;
            slot.active = Some(token);
            (token, slot.callback.replace(Box::new(callback)))
        };
        // Dropped outside the borrow: it may own a Subscription of its own.
        drop(replaced);

        Subscription {
            slot: Rc::downgrade(&self.slot),
            token,
            detached: false,
        }
    }

    /// Starts a mutation cycle with empty accumulators.
    pub fn will_change(&mut self) {
        self.state = NotifierState::Accumulating(ChangeSet::default());
    }

    pub fn record_section(
        &mut self,
        index: usize,
        change: SectionChange,
    ) -> Result<(), NotifierError> {
        let changes = self.accumulator()?;
        match change {
            SectionChange::Insert => changes.inserted_sections.insert(index),
            SectionChange::Delete => changes.deleted_sections.insert(index),
        };
        Ok(())
    }

    pub fn record_item(&mut self, change: ItemChange) -> Result<(), NotifierError> {
        let changes = self.accumulator()?;
        match change {
            ItemChange::Insert(path) => changes.inserted_items.insert(path),
            ItemChange::Delete(path) => changes.deleted_items.insert(path),
            ItemChange::Update(path) => changes.updated_items.insert(path),
            ItemChange::Move { from, to } => changes.moved_items.insert(ItemMove { from, to }),
        };
        Ok(())
    }

    /// Ends the cycle and dispatches everything recorded since `will_change`.
    pub fn did_change(&mut self) -> Result<(), NotifierError> {
        match std::mem::take(&mut self.state) {
            NotifierState::Accumulating(changes) => {
                debug!(
                    "event=change_dispatch module=diff kind=batch changes={}",
                    changes.len()
                );
                self.dispatch(&ChangeEvent::Batch(changes));
                Ok(())
            }
            NotifierState::Idle => Err(NotifierError::NotAccumulating),
        }
    }

    /// Tells the subscriber to discard its state and reload.
    pub fn reload(&mut self) {
        self.state = NotifierState::Idle;
        debug!("event=change_dispatch module=diff kind=reload");
        self.dispatch(&ChangeEvent::Reload);
    }

    fn accumulator(&mut self) -> Result<&mut ChangeSet, NotifierError> {
        match &mut self.state {
            NotifierState::Accumulating(changes) => Ok(changes),
            NotifierState::Idle => Err(NotifierError::NotAccumulating),
        }
    }

    fn dispatch(&self, event: &ChangeEvent) {
        let (token, callback) = {
            let mut slot = self.slot.borrow_mut();
            match slot.active {
                Some(token) => (token, slot.callback.take()),
                None => return,
            }
        };
        // Absent while the same callback is already running higher up the stack.
        let Some(mut callback) = callback else {
            return;
        };

        callback(event);

        let mut slot = self.slot.borrow_mut();
        if slot.active == Some(token) && slot.callback.is_none() {
            slot.callback = Some(callback);
        } else {
            drop(slot);
            drop(callback);
        }
    }
}

/// Handle for the current subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    slot: Weak<RefCell<SubscriberSlot>>,
    token: u64,
    detached: bool,
}

impl Subscription {
    /// Whether this handle still owns the notifier's subscriber slot.
    pub fn is_active(&self) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        let active = slot.borrow().active;
        active == Some(self.token)
    }

    pub fn cancel(self) {}

    /// Keeps the callback registered for the notifier's lifetime.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        let Some(slot) = self.slot.upgrade() else {
            return;
        };
        let removed = {
            let mut slot = slot.borrow_mut();
            if slot.active != Some(self.token) {
                return;
            }
            slot.active = None;
            slot.callback.take()
        };
        drop(removed);
    }
}

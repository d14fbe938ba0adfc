//! Change propagation for sectioned query results.
//!
//! # Responsibility
//! - Describe list mutations as explicit [`ChangeSet`] values.
//! - Compute them from two keyed snapshots and deliver them to one
//!   subscriber through [`ChangeNotifier`].
//!
//! # Invariants
//! - A subscriber sees either `Reload` or a batch that, applied in
//!   [`ChangeSet::steps`] order, turns its previous snapshot into the new one.

pub mod change_set;
pub mod compute;
pub mod live_query;
pub mod notifier;

pub use change_set::{ChangeSet, ChangeSetError, ChangeStep, IndexPath, ItemMove};
pub use compute::{diff_sections, Keyed, Section};
pub use live_query::LiveQuery;
pub use notifier::{
    ChangeEvent, ChangeNotifier, ItemChange, NotifierError, SectionChange, Subscription,
};

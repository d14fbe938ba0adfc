//! Domain model for trackers, categories and completion records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation rules next to the values they protect.
//!
//! # Invariants
//! - Trackers and categories are identified by stable UUIDs.
//! - Completion is a per-day boolean, never a counter.

pub mod category;
pub mod draft;
pub mod filter;
pub mod record;
pub mod tracker;
pub mod weekday;

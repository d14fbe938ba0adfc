//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes re-validate domain values before persistence.
//! - Storage failures are returned as `RepoError::Db`, never swallowed.
//! - Missing targets of delete/toggle are no-ops, not errors.

pub mod category_repo;
pub mod flag_repo;
mod schema;
pub mod tracker_repo;

//! Core domain logic for the habit tracker.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod diff;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, TrackerConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, StoreLocation};
pub use diff::{ChangeEvent, ChangeSet, IndexPath, Subscription};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{Category, CategoryId};
pub use model::filter::{EmptyState, FilterMode};
pub use model::tracker::{Tracker, TrackerColor, TrackerId, TrackerValidationError};
pub use model::weekday::{Schedule, WeekdayType};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::flag_repo::{FlagRepository, SqliteFlagRepository};
pub use repo::tracker_repo::{
    RepoError, RepoResult, SqliteTrackerRepository, TrackerQuery, TrackerRepository,
};
pub use service::category_service::CategoryDataProvider;
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::statistics_service::StatisticsService;
pub use service::tracker_service::{
    ServiceError, ServiceResult, TrackerCard, TrackerDataProvider, TrackersSnapshot,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

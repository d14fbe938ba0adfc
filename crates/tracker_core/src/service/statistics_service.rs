//! Completion statistics.

use crate::model::record::CompletionRecord;
use crate::model::tracker::TrackerId;
use crate::repo::tracker_repo::{RepoResult, TrackerRepository};

pub struct StatisticsService<R: TrackerRepository> {
    repo: R,
}

impl<R: TrackerRepository> StatisticsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Number of completion records across all trackers and days.
    pub fn completed_trackers_count(&self) -> RepoResult<u32> {
        self.repo.total_completion_count()
    }

    /// Days one tracker was completed on, oldest first.
    pub fn completion_history(&self, id: TrackerId) -> RepoResult<Vec<CompletionRecord>> {
        self.repo.completion_records(id)
    }
}

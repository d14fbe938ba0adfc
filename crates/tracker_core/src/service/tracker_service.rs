//! Tracker aggregation service.
//!
//! # Responsibility
//! - Compose the day/search/filter query and expose it as a live snapshot.
//! - Route tracker writes and completion toggles to the repository.
//!
//! # Invariants
//! - A query whose parameters differ from the previous one is announced as
//!   `ChangeEvent::Reload`; a re-run of the same query as an itemized batch.
//! - Tracker writes refresh the active query; completion toggles do not.
//! - Completion can't be recorded for a day after the clock's today.

use crate::diff::{ChangeEvent, Keyed, LiveQuery, NotifierError, Section, Subscription};
use crate::model::category::{Category, CategoryId};
use crate::model::filter::{EmptyState, FilterMode};
use crate::model::tracker::{Tracker, TrackerId};
use crate::repo::tracker_repo::{RepoError, TrackerEntry, TrackerQuery, TrackerRepository};
use crate::service::clock::{Clock, SystemClock};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Completion was requested for a day that has not started yet.
    FutureDate { date: NaiveDate, today: NaiveDate },
    Repo(RepoError),
    Notifier(NotifierError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FutureDate { date, today } => write!(
                f,
                "cannot complete a tracker for {date}; today is {today}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Notifier(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FutureDate { .. } => None,
            Self::Repo(err) => Some(err),
            Self::Notifier(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NotifierError> for ServiceError {
    fn from(value: NotifierError) -> Self {
        Self::Notifier(value)
    }
}

/// One row of the tracker list: the tracker plus its completion state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerCard {
    pub tracker: Tracker,
    /// Completed on the queried day.
    pub is_completed: bool,
    /// Completion records across all days.
    pub completed_days: u32,
}

impl Keyed for TrackerCard {
    type Key = TrackerId;

    fn key(&self) -> TrackerId {
        self.tracker.id
    }
}

impl Keyed for Category {
    type Key = CategoryId;

    fn key(&self) -> CategoryId {
        self.id
    }
}

pub type TrackerListSection = Section<Category, TrackerCard>;

/// Result of one `trackers()` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackersSnapshot {
    /// Day that was queried; today's date for `TodayTrackers`.
    pub date: NaiveDate,
    pub filter: FilterMode,
    pub sections: Vec<TrackerListSection>,
    pub empty_state: EmptyState,
}

impl TrackersSnapshot {
    pub fn tracker_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }
}

/// Facade the presentation layer talks to for the tracker list.
pub struct TrackerDataProvider<R: TrackerRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    live: LiveQuery<Category, TrackerCard>,
    active_query: Option<TrackerQuery>,
}

impl<R: TrackerRepository> TrackerDataProvider<R, SystemClock> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: TrackerRepository, C: Clock> TrackerDataProvider<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            live: LiveQuery::new(),
            active_query: None,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Registers the only change subscriber; see [`Subscription`].
    pub fn subscribe(&self, callback: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.live.subscribe(callback)
    }

    /// Runs the tracker list query and publishes the result.
    ///
    /// `TodayTrackers` ignores `date` and uses the clock's today.
    pub fn trackers(
        &mut self,
        date: NaiveDate,
        filter: FilterMode,
        search_text: Option<&str>,
    ) -> ServiceResult<TrackersSnapshot> {
        let date = match filter {
            FilterMode::TodayTrackers => self.clock.today(),
            _ => date,
        };
        let query = TrackerQuery::new(date, filter).with_search_text(search_text);
        let sections = self.load(&query)?;

        if self.active_query.as_ref() == Some(&query) {
            self.live.apply_mutation(sections)?;
        } else {
            debug!(
                "event=tracker_query module=service status=reconfigured date={date} filter={filter}"
            );
            self.live.replace(sections);
        }

        let snapshot = TrackersSnapshot {
            date,
            filter,
            sections: self.live.snapshot().to_vec(),
            empty_state: EmptyState::classify(
                self.live.snapshot().is_empty(),
                query.is_search_active(),
                filter,
            ),
        };
        self.active_query = Some(query);
        Ok(snapshot)
    }

    /// Inserts or updates a tracker and refreshes the active list.
    pub fn add_or_update_tracker(
        &mut self,
        tracker: &Tracker,
        category_title: &str,
    ) -> ServiceResult<()> {
        self.repo.add_or_update_tracker(tracker, category_title)?;
        info!(
            "event=tracker_save module=service status=ok tracker_id={}",
            tracker.id
        );
        self.refresh()
    }

    /// Deletes a tracker. Returns `false` when the id was unknown.
    pub fn delete_tracker(&mut self, id: TrackerId) -> ServiceResult<bool> {
        let deleted = self.repo.delete_tracker(id)?;
        if !deleted {
            warn!("event=tracker_delete module=service status=not_found tracker_id={id}");
            return Ok(false);
        }
        info!("event=tracker_delete module=service status=ok tracker_id={id}");
        self.refresh()?;
        Ok(true)
    }

    /// Toggles completion for `date` and returns the new state.
    ///
    /// The list is not re-queried; call [`Self::trackers`] again to receive
    /// the resulting update.
    pub fn complete_tracker(&self, id: TrackerId, date: NaiveDate) -> ServiceResult<bool> {
        let today = self.clock.today();
        if date > today {
            warn!("event=tracker_complete module=service status=rejected reason=future_date");
            return Err(ServiceError::FutureDate { date, today });
        }
        let completed = self.repo.toggle_completion(id, date)?;
        info!(
            "event=tracker_complete module=service status=ok tracker_id={id} completed={completed}"
        );
        Ok(completed)
    }

    pub fn is_completed(&self, id: TrackerId, date: NaiveDate) -> ServiceResult<bool> {
        Ok(self.repo.is_completed(id, date)?)
    }

    pub fn completion_count(&self, id: TrackerId) -> ServiceResult<u32> {
        Ok(self.repo.completion_count(id)?)
    }

    pub fn total_completion_count(&self) -> ServiceResult<u32> {
        Ok(self.repo.total_completion_count()?)
    }

    /// Tracker and its category, for edit flows.
    pub fn get_tracker(&self, id: TrackerId) -> ServiceResult<Option<TrackerEntry>> {
        Ok(self.repo.get_tracker(id)?)
    }

    fn refresh(&mut self) -> ServiceResult<()> {
        let Some(query) = self.active_query.clone() else {
            return Ok(());
        };
        let sections = self.load(&query)?;
        self.live.apply_mutation(sections)?;
        Ok(())
    }

    fn load(&self, query: &TrackerQuery) -> ServiceResult<Vec<TrackerListSection>> {
        let sections = self.repo.query_trackers(query)?;
        let mut result = Vec::with_capacity(sections.len());
        for section in sections {
            let mut cards = Vec::with_capacity(section.trackers.len());
            for tracker in section.trackers {
                cards.push(TrackerCard {
                    is_completed: self.repo.is_completed(tracker.id, query.date)?,
                    completed_days: self.repo.completion_count(tracker.id)?,
                    tracker,
                });
            }
            result.push(Section::new(section.category, cards));
        }
        Ok(result)
    }
}

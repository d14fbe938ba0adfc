use chrono::NaiveDate;
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use tracker_core::db::open_db_in_memory;
use tracker_core::diff::{ChangeSet, IndexPath};
use tracker_core::{
    CategoryDataProvider, CategoryRepository, ChangeEvent, EmptyState, FilterMode, FixedClock,
    ServiceError, SqliteCategoryRepository, SqliteTrackerRepository, StatisticsService, Tracker,
    TrackerColor, TrackerDataProvider, TrackerRepository, WeekdayType,
};
use uuid::Uuid;

type Events = Rc<RefCell<Vec<ChangeEvent>>>;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn tracker(title: &str) -> Tracker {
    Tracker::new(
        title,
        TrackerColor::from_rgb(200, 100, 50),
        "✅",
        WeekdayType::ALL.into_iter().collect(),
    )
}

fn provider<'a>(
    conn: &'a Connection,
    categories: &[&str],
) -> TrackerDataProvider<SqliteTrackerRepository<'a>, FixedClock> {
    let category_repo = SqliteCategoryRepository::try_new(conn).unwrap();
    for title in categories {
        category_repo.create_category(title).unwrap();
    }
    TrackerDataProvider::with_clock(
        SqliteTrackerRepository::try_new(conn).unwrap(),
        FixedClock(monday()),
    )
}

fn record(events: &Events) -> impl FnMut(&ChangeEvent) + 'static {
    let sink = Rc::clone(events);
    move |event: &ChangeEvent| sink.borrow_mut().push(event.clone())
}

fn take_batch(events: &Events) -> ChangeSet {
    match events.borrow_mut().pop() {
        Some(ChangeEvent::Batch(changes)) => changes,
        other => panic!("expected batch, got {other:?}"),
    }
}

#[test]
fn new_query_reloads_and_same_query_batches() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health"]);
    let run = tracker("Run");
    provider.add_or_update_tracker(&run, "Health").unwrap();

    let events: Events = Rc::default();
    let _subscription = provider.subscribe(record(&events));

    let first = provider
        .trackers(monday(), FilterMode::AllTrackers, None)
        .unwrap();
    assert_eq!(first.tracker_count(), 1);
    assert_eq!(first.empty_state, EmptyState::None);
    assert_eq!(*events.borrow(), vec![ChangeEvent::Reload]);

    // Completion does not re-query on its own.
    assert!(provider.complete_tracker(run.id, monday()).unwrap());
    assert_eq!(events.borrow().len(), 1);

    let second = provider
        .trackers(monday(), FilterMode::AllTrackers, None)
        .unwrap();
    assert!(second.sections[0].items[0].is_completed);
    assert_eq!(second.sections[0].items[0].completed_days, 1);
    let changes = take_batch(&events);
    assert_eq!(
        changes.updated_items.iter().copied().collect::<Vec<_>>(),
        vec![IndexPath::new(0, 0)]
    );

    // Changing the search text is a new query.
    provider
        .trackers(monday(), FilterMode::AllTrackers, Some("ru"))
        .unwrap();
    assert_eq!(events.borrow().last(), Some(&ChangeEvent::Reload));
}

#[test]
fn writes_refresh_the_active_query_with_itemized_changes() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health", "Work"]);
    let run = tracker("Run");
    provider.add_or_update_tracker(&run, "Health").unwrap();

    let events: Events = Rc::default();
    let _subscription = provider.subscribe(record(&events));
    provider
        .trackers(monday(), FilterMode::AllTrackers, None)
        .unwrap();

    let stretch = tracker("Stretch");
    provider.add_or_update_tracker(&stretch, "Health").unwrap();
    let inserted = take_batch(&events);
    assert!(inserted.inserted_items.contains(&IndexPath::new(0, 1)));

    let email = tracker("Email");
    provider.add_or_update_tracker(&email, "Work").unwrap();
    let new_section = take_batch(&events);
    assert!(new_section.inserted_sections.contains(&1));
    assert!(new_section.inserted_items.is_empty());

    assert!(provider.delete_tracker(run.id).unwrap());
    let deleted = take_batch(&events);
    assert!(deleted.deleted_items.contains(&IndexPath::new(0, 0)));

    assert!(!provider.delete_tracker(run.id).unwrap());
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn today_filter_uses_clock_and_future_completion_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health"]);
    let run = tracker("Run");
    provider.add_or_update_tracker(&run, "Health").unwrap();

    let far_away = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
    let snapshot = provider
        .trackers(far_away, FilterMode::TodayTrackers, None)
        .unwrap();
    assert_eq!(snapshot.date, monday());

    let tomorrow = monday().succ_opt().unwrap();
    match provider.complete_tracker(run.id, tomorrow) {
        Err(ServiceError::FutureDate { date, today }) => {
            assert_eq!(date, tomorrow);
            assert_eq!(today, monday());
        }
        other => panic!("expected future date error, got {other:?}"),
    }
    assert!(!provider.is_completed(run.id, tomorrow).unwrap());
}

#[test]
fn empty_states_follow_query_inputs() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health"]);

    let nothing = provider
        .trackers(monday(), FilterMode::AllTrackers, None)
        .unwrap();
    assert_eq!(nothing.empty_state, EmptyState::NoTrackers);

    provider
        .add_or_update_tracker(&tracker("Run"), "Health")
        .unwrap();
    let not_found = provider
        .trackers(monday(), FilterMode::AllTrackers, Some("swim"))
        .unwrap();
    assert_eq!(not_found.empty_state, EmptyState::NotFound);

    let none_completed = provider
        .trackers(monday(), FilterMode::CompletedTrackers, None)
        .unwrap();
    assert_eq!(none_completed.empty_state, EmptyState::NotFound);
}

#[test]
fn last_subscription_wins() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health"]);
    let first_events: Events = Rc::default();
    let second_events: Events = Rc::default();

    let first = provider.subscribe(record(&first_events));
    let _second = provider.subscribe(record(&second_events));
    drop(first);

    provider
        .trackers(monday(), FilterMode::AllTrackers, None)
        .unwrap();
    assert!(first_events.borrow().is_empty());
    assert_eq!(*second_events.borrow(), vec![ChangeEvent::Reload]);
}

#[test]
fn category_provider_reports_creates_and_renames() {
    let conn = open_db_in_memory().unwrap();
    let mut categories = CategoryDataProvider::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    assert!(categories.is_empty().unwrap());

    let events: Events = Rc::default();
    let _subscription = categories.subscribe(record(&events));
    assert!(categories.categories().unwrap().is_empty());
    assert_eq!(*events.borrow(), vec![ChangeEvent::Reload]);

    let work = categories.create_category("Work").unwrap();
    assert!(take_batch(&events).inserted_sections.contains(&0));

    categories.create_category("Health").unwrap();
    assert!(take_batch(&events)
        .inserted_items
        .contains(&IndexPath::new(0, 0)));

    let renamed = categories.rename_category(work.id, "Admin").unwrap();
    assert_eq!(renamed.id, work.id);
    let changes = take_batch(&events);
    assert!(!changes.is_empty());

    let titles: Vec<String> = categories
        .categories()
        .unwrap()
        .into_iter()
        .map(|category| category.title)
        .collect();
    assert_eq!(titles, vec!["Admin", "Health"]);
    assert!(matches!(
        categories.create_category("Health"),
        Err(ServiceError::Repo(_))
    ));
}

#[test]
fn statistics_count_all_completion_records() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = provider(&conn, &["Health"]);
    let run = tracker("Run");
    let read = tracker("Read");
    provider.add_or_update_tracker(&run, "Health").unwrap();
    provider.add_or_update_tracker(&read, "Health").unwrap();
    let sunday = monday().pred_opt().unwrap();
    provider.complete_tracker(run.id, monday()).unwrap();
    provider.complete_tracker(run.id, sunday).unwrap();
    provider.complete_tracker(read.id, monday()).unwrap();
    assert_eq!(provider.total_completion_count().unwrap(), 3);

    // The provider hands out its repository for reads it does not wrap.
    let stored = provider.repository().get_tracker(run.id).unwrap().unwrap();
    assert_eq!(stored.category.title, "Health");

    let stats = StatisticsService::new(SqliteTrackerRepository::try_new(&conn).unwrap());
    assert_eq!(stats.completed_trackers_count().unwrap(), 3);
    let history: Vec<NaiveDate> = stats
        .completion_history(run.id)
        .unwrap()
        .into_iter()
        .map(|record| record.day)
        .collect();
    assert_eq!(history, vec![sunday, monday()]);
    assert!(stats.completion_history(Uuid::new_v4()).unwrap().is_empty());
}

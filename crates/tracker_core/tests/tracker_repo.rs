use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use std::collections::HashSet;
use tracker_core::db::open_db_in_memory;
use tracker_core::model::weekday::weekday_for;
use tracker_core::{
    CategoryRepository, FilterMode, RepoError, Schedule, SqliteCategoryRepository,
    SqliteTrackerRepository, Tracker, TrackerColor, TrackerId, TrackerQuery, TrackerRepository,
    TrackerValidationError, WeekdayType,
};
use uuid::Uuid;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn schedule(days: &[WeekdayType]) -> Schedule {
    days.iter().copied().collect()
}

fn tracker(title: &str, days: &[WeekdayType]) -> Tracker {
    Tracker::new(
        title,
        TrackerColor::from_rgb(0x33, 0x99, 0xff),
        "🏃",
        schedule(days),
    )
}

fn seeded<'a>(conn: &'a Connection, categories: &[&str]) -> SqliteTrackerRepository<'a> {
    let category_repo = SqliteCategoryRepository::try_new(conn).unwrap();
    for title in categories {
        category_repo.create_category(title).unwrap();
    }
    SqliteTrackerRepository::try_new(conn).unwrap()
}

fn ids(repo: &SqliteTrackerRepository<'_>, query: &TrackerQuery) -> HashSet<TrackerId> {
    repo.query_trackers(query)
        .unwrap()
        .into_iter()
        .flat_map(|section| section.trackers)
        .map(|tracker| tracker.id)
        .collect()
}

#[test]
fn health_run_scenario() {
    use WeekdayType::*;
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);

    let run = tracker("Run", &[Monday, Wednesday, Friday]);
    repo.add_or_update_tracker(&run, "Health").unwrap();

    let sections = repo
        .query_trackers(&TrackerQuery::new(monday(), FilterMode::AllTrackers))
        .unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].category.title, "Health");
    assert_eq!(sections[0].trackers, vec![run.clone()]);

    let tuesday_sections = repo
        .query_trackers(&TrackerQuery::new(tuesday(), FilterMode::AllTrackers))
        .unwrap();
    assert!(tuesday_sections.is_empty());

    assert!(repo.toggle_completion(run.id, monday()).unwrap());
    assert!(repo.is_completed(run.id, monday()).unwrap());
    assert!(!repo.toggle_completion(run.id, monday()).unwrap());
    assert!(!repo.is_completed(run.id, monday()).unwrap());

    assert!(repo.delete_tracker(run.id).unwrap());
    let after_delete = repo
        .query_trackers(&TrackerQuery::new(monday(), FilterMode::AllTrackers))
        .unwrap();
    assert!(after_delete.is_empty());
}

#[test]
fn toggling_twice_restores_state_for_each_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);
    let read = tracker("Read", &WeekdayType::ALL);
    repo.add_or_update_tracker(&read, "Health").unwrap();
    repo.toggle_completion(read.id, tuesday()).unwrap();

    for day in [monday(), tuesday()] {
        let before = repo.is_completed(read.id, day).unwrap();
        repo.toggle_completion(read.id, day).unwrap();
        repo.toggle_completion(read.id, day).unwrap();
        assert_eq!(repo.is_completed(read.id, day).unwrap(), before);
    }
}

#[test]
fn query_never_returns_unscheduled_trackers() {
    use WeekdayType::*;
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Daily"]);
    let weekend = tracker("Weekend", &[Saturday, Sunday]);
    let weekdays = tracker("Weekdays", &[Monday, Tuesday, Wednesday, Thursday, Friday]);
    let wednesday = tracker("Wednesday", &[Wednesday]);
    for item in [&weekend, &weekdays, &wednesday] {
        repo.add_or_update_tracker(item, "Daily").unwrap();
    }

    for offset in 0..14 {
        let date = monday() + chrono::Duration::days(offset);
        let weekday = weekday_for(date);
        assert_eq!(
            weekday.code().to_digit(10).unwrap(),
            date.weekday().number_from_monday()
        );
        let sections = repo
            .query_trackers(&TrackerQuery::new(date, FilterMode::AllTrackers))
            .unwrap();
        for section in sections {
            for found in section.trackers {
                assert!(found.is_scheduled_on(weekday), "{} on {date}", found.title);
            }
        }
    }
}

#[test]
fn search_is_case_insensitive_substring() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Misc"]);
    let abc = tracker("ABCdef", &WeekdayType::ALL);
    repo.add_or_update_tracker(&abc, "Misc").unwrap();

    let hit = TrackerQuery::new(monday(), FilterMode::AllTrackers).with_search_text(Some("abc"));
    assert_eq!(ids(&repo, &hit), HashSet::from([abc.id]));

    let miss = TrackerQuery::new(monday(), FilterMode::AllTrackers).with_search_text(Some("xyz"));
    assert!(ids(&repo, &miss).is_empty());

    let blank = TrackerQuery::new(monday(), FilterMode::AllTrackers).with_search_text(Some("   "));
    assert!(!blank.is_search_active());
    assert_eq!(ids(&repo, &blank).len(), 1);
}

#[test]
fn search_ignores_diacritics_both_ways() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Food"]);
    let cafe = tracker("Café", &WeekdayType::ALL);
    let naive = tracker("naive reading", &WeekdayType::ALL);
    repo.add_or_update_tracker(&cafe, "Food").unwrap();
    repo.add_or_update_tracker(&naive, "Food").unwrap();

    for text in ["cafe", "CAFÉ", "afé"] {
        let query = TrackerQuery::new(monday(), FilterMode::AllTrackers).with_search_text(Some(text));
        assert_eq!(ids(&repo, &query), HashSet::from([cafe.id]), "{text}");
    }
    let accented = TrackerQuery::new(monday(), FilterMode::AllTrackers).with_search_text(Some("naïve"));
    assert_eq!(ids(&repo, &accented), HashSet::from([naive.id]));
}

#[test]
fn completed_and_uncompleted_filters_partition_the_day() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["A", "B"]);
    let all: Vec<Tracker> = (0..5)
        .map(|index| tracker(&format!("habit {index}"), &WeekdayType::ALL))
        .collect();
    for (index, item) in all.iter().enumerate() {
        let category = if index % 2 == 0 { "A" } else { "B" };
        repo.add_or_update_tracker(item, category).unwrap();
    }
    repo.toggle_completion(all[0].id, monday()).unwrap();
    repo.toggle_completion(all[3].id, monday()).unwrap();
    repo.toggle_completion(all[4].id, tuesday()).unwrap();

    let completed = ids(
        &repo,
        &TrackerQuery::new(monday(), FilterMode::CompletedTrackers),
    );
    let uncompleted = ids(
        &repo,
        &TrackerQuery::new(monday(), FilterMode::UncompletedTrackers),
    );
    let everything = ids(&repo, &TrackerQuery::new(monday(), FilterMode::AllTrackers));

    assert_eq!(completed, HashSet::from([all[0].id, all[3].id]));
    assert!(completed.is_disjoint(&uncompleted));
    assert_eq!(
        completed.union(&uncompleted).copied().collect::<HashSet<_>>(),
        everything
    );
}

#[test]
fn results_are_grouped_and_ordered_by_titles() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Work", "Health"]);
    let stretch = tracker("Stretch", &WeekdayType::ALL);
    let email = tracker("Email zero", &WeekdayType::ALL);
    let run = tracker("Run", &WeekdayType::ALL);
    repo.add_or_update_tracker(&stretch, "Health").unwrap();
    repo.add_or_update_tracker(&email, "Work").unwrap();
    repo.add_or_update_tracker(&run, "Health").unwrap();

    let sections = repo
        .query_trackers(&TrackerQuery::new(monday(), FilterMode::AllTrackers))
        .unwrap();
    let layout: Vec<(String, Vec<String>)> = sections
        .into_iter()
        .map(|section| {
            (
                section.category.title,
                section.trackers.into_iter().map(|t| t.title).collect(),
            )
        })
        .collect();
    assert_eq!(
        layout,
        vec![
            ("Health".to_string(), vec!["Run".to_string(), "Stretch".to_string()]),
            ("Work".to_string(), vec!["Email zero".to_string()]),
        ]
    );
}

#[test]
fn update_replaces_fields_and_category() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health", "Mind"]);
    let mut item = tracker("Meditate", &[WeekdayType::Monday]);
    repo.add_or_update_tracker(&item, "Health").unwrap();

    item.title = "Meditate 10 min".to_string();
    item.color = TrackerColor::from_hex("#00aa00").unwrap();
    item.schedule = schedule(&[WeekdayType::Tuesday]);
    repo.add_or_update_tracker(&item, "  Mind ").unwrap();

    let entry = repo.get_tracker(item.id).unwrap().unwrap();
    assert_eq!(entry.tracker, item);
    assert_eq!(entry.category.title, "Mind");
    assert!(ids(&repo, &TrackerQuery::new(monday(), FilterMode::AllTrackers)).is_empty());
}

#[test]
fn missing_category_and_invalid_tracker_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);

    let err = repo
        .add_or_update_tracker(&tracker("Swim", &WeekdayType::ALL), "Sport")
        .unwrap_err();
    assert!(matches!(err, RepoError::CategoryNotFound(title) if title == "Sport"));

    let err = repo
        .add_or_update_tracker(&tracker("Swim", &[]), "Health")
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(TrackerValidationError::EmptySchedule)
    ));
    assert_eq!(
        ids(&repo, &TrackerQuery::new(monday(), FilterMode::AllTrackers)).len(),
        0
    );
}

#[test]
fn delete_cascades_completion_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);
    let run = tracker("Run", &WeekdayType::ALL);
    repo.add_or_update_tracker(&run, "Health").unwrap();
    repo.toggle_completion(run.id, monday()).unwrap();
    repo.toggle_completion(run.id, tuesday()).unwrap();
    assert_eq!(repo.completion_count(run.id).unwrap(), 2);
    assert_eq!(repo.total_completion_count().unwrap(), 2);

    assert!(repo.delete_tracker(run.id).unwrap());
    assert_eq!(repo.completion_count(run.id).unwrap(), 0);
    assert_eq!(repo.total_completion_count().unwrap(), 0);
    assert!(repo.get_tracker(run.id).unwrap().is_none());
}

#[test]
fn unknown_ids_are_no_ops() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &[]);
    let ghost = Uuid::new_v4();

    assert!(!repo.delete_tracker(ghost).unwrap());
    assert!(!repo.toggle_completion(ghost, monday()).unwrap());
    assert_eq!(repo.total_completion_count().unwrap(), 0);
}

#[test]
fn completion_records_are_listed_oldest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);
    let run = tracker("Run", &WeekdayType::ALL);
    repo.add_or_update_tracker(&run, "Health").unwrap();
    repo.toggle_completion(run.id, tuesday()).unwrap();
    repo.toggle_completion(run.id, monday()).unwrap();

    let days: Vec<NaiveDate> = repo
        .completion_records(run.id)
        .unwrap()
        .into_iter()
        .map(|record| record.day)
        .collect();
    assert_eq!(days, vec![monday(), tuesday()]);
}

#[test]
fn corrupted_schedule_surfaces_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded(&conn, &["Health"]);
    let run = tracker("Run", &WeekdayType::ALL);
    repo.add_or_update_tracker(&run, "Health").unwrap();
    conn.execute(
        "UPDATE trackers SET schedule = '19' WHERE uuid = ?1;",
        [run.id.to_string()],
    )
    .unwrap();

    let err = repo.get_tracker(run.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

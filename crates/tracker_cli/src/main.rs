//! Command-line entry point.
//!
//! # Responsibility
//! - Resolve config from file and flags, then start logging and open the store.
//! - Run one command against the core services and print plain-text output.

mod cli;

use chrono::NaiveDate;
use clap::Parser;
use cli::{CategoryCommand, Cli, Command, TrackerCommand, TrackerFields};
use log::info;
use std::error::Error;
use tracker_core::model::draft::{TrackerDraft, TrackerEditMode};
use tracker_core::model::weekday::label_text;
use tracker_core::service::onboarding::{mark_onboarding_shown, was_onboarding_shown};
use tracker_core::{
    init_logging, open_db, CategoryDataProvider, CategoryRepository, Clock, SqliteCategoryRepository,
    SqliteFlagRepository, SqliteTrackerRepository, StatisticsService, SystemClock, TrackerConfig,
    TrackerDataProvider, TrackersSnapshot,
};

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = std::path::absolute(log_dir)?;
        init_logging(&config.log_level, &log_dir)?;
    }

    if let Command::Ping = cli.command {
        println!("tracker_core ping={}", tracker_core::ping());
        println!("tracker_core version={}", tracker_core::core_version());
        return Ok(());
    }

    let conn = open_db(&config.db_path)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    match cli.command {
        Command::Ping => {}
        Command::Category(command) => {
            let mut categories = CategoryDataProvider::new(SqliteCategoryRepository::try_new(&conn)?);
            run_category(&mut categories, command)?;
        }
        Command::Tracker(command) => {
            let mut trackers = TrackerDataProvider::new(SqliteTrackerRepository::try_new(&conn)?);
            run_tracker(&mut trackers, command)?;
        }
        Command::Complete { id, date } => {
            let trackers = TrackerDataProvider::new(SqliteTrackerRepository::try_new(&conn)?);
            let date = date.unwrap_or_else(|| trackers.today());
            let completed = trackers.complete_tracker(id, date)?;
            let state = if completed { "completed" } else { "not completed" };
            println!("{id} {state} on {date}");
        }
        Command::Stats => {
            let stats = StatisticsService::new(SqliteTrackerRepository::try_new(&conn)?);
            println!("completed trackers: {}", stats.completed_trackers_count()?);
        }
        Command::Onboarding { mark } => {
            let flags = SqliteFlagRepository::try_new(&conn)?;
            if mark {
                mark_onboarding_shown(&flags)?;
            }
            println!("onboarding shown: {}", was_onboarding_shown(&flags)?);
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Ping => "ping",
        Command::Category(_) => "category",
        Command::Tracker(_) => "tracker",
        Command::Complete { .. } => "complete",
        Command::Stats => "stats",
        Command::Onboarding { .. } => "onboarding",
    }
}

fn run_category<R: CategoryRepository>(
    categories: &mut CategoryDataProvider<R>,
    command: CategoryCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        CategoryCommand::Add { title } => {
            let category = categories.create_category(&title)?;
            println!("{} {}", category.id, category.title);
        }
        CategoryCommand::List => {
            for category in categories.categories()? {
                let count = categories.tracker_count(category.id)?;
                println!("{} {} ({count})", category.id, category.title);
            }
        }
        CategoryCommand::Rename { title, new_title } => {
            let current = categories
                .categories()?
                .into_iter()
                .find(|category| category.title == title.trim())
                .ok_or_else(|| format!("category not found: `{title}`"))?;
            let renamed = categories.rename_category(current.id, &new_title)?;
            println!("{} {}", renamed.id, renamed.title);
        }
    }
    Ok(())
}

fn run_tracker(
    trackers: &mut TrackerDataProvider<SqliteTrackerRepository<'_>, SystemClock>,
    command: TrackerCommand,
) -> Result<(), Box<dyn Error>> {
    match command {
        TrackerCommand::Add(fields) => {
            let mut draft = TrackerDraft::new(&TrackerEditMode::Create);
            apply_fields(&mut draft, fields);
            let (tracker, category_title) = draft.build()?;
            trackers.add_or_update_tracker(&tracker, &category_title)?;
            println!("{}", tracker.id);
        }
        TrackerCommand::Edit { id, fields } => {
            let entry = trackers
                .get_tracker(id)?
                .ok_or_else(|| format!("tracker not found: {id}"))?;
            let mut draft = TrackerDraft::new(&TrackerEditMode::Edit {
                tracker: entry.tracker,
                category_title: entry.category.title,
            });
            apply_fields(&mut draft, fields);
            let (tracker, category_title) = draft.build()?;
            trackers.add_or_update_tracker(&tracker, &category_title)?;
            println!("{}", tracker.id);
        }
        TrackerCommand::List {
            date,
            filter,
            search,
        } => {
            let date = date.unwrap_or_else(|| SystemClock.today());
            let snapshot = trackers.trackers(date, filter, search.as_deref())?;
            print_snapshot(&snapshot);
        }
        TrackerCommand::Delete { id } => {
            if trackers.delete_tracker(id)? {
                println!("deleted {id}");
            } else {
                println!("no tracker {id}");
            }
        }
    }
    Ok(())
}

fn apply_fields(draft: &mut TrackerDraft, fields: TrackerFields) {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(emoji) = fields.emoji {
        draft.emoji = emoji;
    }
    if fields.color.is_some() {
        draft.color = fields.color;
    }
    if fields.category.is_some() {
        draft.category_title = fields.category;
    }
    if !fields.days.is_empty() {
        draft.weekdays = fields.days.into_iter().collect();
    }
}

fn print_snapshot(snapshot: &TrackersSnapshot) {
    println!("{} ({})", format_day(snapshot.date), snapshot.filter);
    if snapshot.sections.is_empty() {
        println!("  {:?}", snapshot.empty_state);
        return;
    }
    for section in &snapshot.sections {
        println!("{}", section.header.title);
        for card in &section.items {
            let mark = if card.is_completed { "x" } else { " " };
            println!(
                "  [{mark}] {} {} ({}; {} days) {}",
                card.tracker.emoji,
                card.tracker.title,
                label_text(&card.tracker.schedule).unwrap_or_default(),
                card.completed_days,
                card.tracker.id
            );
        }
    }
}

fn format_day(date: NaiveDate) -> String {
    date.format("%a %Y-%m-%d").to_string()
}

//! Command-line surface.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracker_core::{FilterMode, TrackerColor, WeekdayType};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "tracker", version, about = "Habit tracker")]
pub struct Cli {
    /// TOML config file; flags below override its values.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enables file logging into this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print core linkage info.
    Ping,
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Tracker(TrackerCommand),
    /// Toggle completion of a tracker for one day.
    Complete {
        id: Uuid,
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print completion statistics.
    Stats,
    /// Show or set the onboarding flag.
    Onboarding {
        #[arg(long)]
        mark: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Add { title: String },
    List,
    Rename { title: String, new_title: String },
}

#[derive(Debug, Subcommand)]
pub enum TrackerCommand {
    Add(TrackerFields),
    /// Change fields of an existing tracker; omitted fields keep their value.
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: TrackerFields,
    },
    List {
        /// Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// all | today | completed | uncompleted
        #[arg(long, default_value = "all")]
        filter: FilterMode,
        #[arg(long)]
        search: Option<String>,
    },
    Delete { id: Uuid },
}

#[derive(Debug, Args)]
pub struct TrackerFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub emoji: Option<String>,
    /// Hex color, `#RRGGBB`.
    #[arg(long, value_parser = parse_color)]
    pub color: Option<TrackerColor>,
    #[arg(long)]
    pub category: Option<String>,
    /// Comma-separated days, e.g. `mon,wed,fri` or `1,3,5`.
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<WeekdayType>,
}

fn parse_color(value: &str) -> Result<TrackerColor, String> {
    TrackerColor::from_hex(value).map_err(|err| err.to_string())
}

use crate::export::{DuplicatePolicy, ExportFormat};
use clap::{Parser, Subcommand};

/// Command-line interface definition for daytrack
/// Local-first day tracking: segments, check-ins and tasks in one SQLite file
#[derive(Parser)]
#[command(
    name = "daytrack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track your day by segments: wellbeing check-ins, tasks and timers stored locally in SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show or check the configuration file
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,
    },

    /// Manage the database (migrations, integrity checks, info)
    Db {
        #[arg(long = "migrate", help = "Run pending data migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Insert missing default data (segments, metrics, settings, ...)
    Seed,

    /// List the day segments
    Segments {
        #[arg(long = "reset", help = "Replace all segments with the defaults")]
        reset: bool,

        #[arg(long = "at", help = "Show only the segment covering HH:MM")]
        at: Option<String>,
    },

    /// Record or list wellbeing check-ins
    Checkin {
        #[command(subcommand)]
        action: CheckinAction,
    },

    /// Manage single tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Read, change, export or import settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Export or import the task list
    Tasks {
        #[command(subcommand)]
        action: TasksAction,
    },
}

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Record a check-in (metrics 1-10)
    Add {
        #[arg(long)]
        mood: u8,
        #[arg(long)]
        energy: u8,
        #[arg(long)]
        focus: u8,
        #[arg(long)]
        stress: u8,
        #[arg(long)]
        motivation: u8,

        /// Segment id or name (default: the segment covering the current time)
        #[arg(long)]
        segment: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List check-ins of a day
    List {
        /// Date (YYYY-MM-DD or "today")
        #[arg(default_value = "today")]
        date: String,
    },

    /// Remove the voice transcription of a check-in
    ClearTranscription { id: String },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task
    Add {
        name: String,

        #[arg(long = "type", default_value = "standard", help = "standard, tally, subtasks, stopwatch, timer or alarm")]
        task_type: String,

        #[arg(long, help = "Preferred segment id or name")]
        segment: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, help = "Create the task from a template (ignores --type)")]
        template: Option<String>,
    },

    /// Toggle completion of a task for a day
    Toggle {
        /// Task id or name
        task: String,

        #[arg(long, default_value_t = 1.0, help = "Completion to add (0-1]")]
        value: f64,

        #[arg(long, default_value = "today")]
        date: String,
    },

    /// List tasks
    List {
        #[arg(long, default_value = "all", help = "all, todo, started or completed")]
        status: String,

        #[arg(long, help = "Include archived tasks")]
        archived: bool,
    },

    /// Move a task to another preferred segment
    Move {
        task: String,

        #[arg(long, help = "Segment id or name; omit to clear")]
        segment: Option<String>,
    },

    /// Archive a task (kept, hidden from lists)
    Archive { task: String },

    /// Delete a task with its subtasks and history
    Delete { task: String },

    /// Show usage figures of a task
    Stats { task: String },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one setting, or all of them
    Get { key: Option<String> },

    /// Set a setting (value parsed as JSON, else stored as text)
    Set { key: String, value: String },

    /// Export settings to a JSON file
    Export {
        file: String,
        #[arg(long, help = "Overwrite the output file if it exists")]
        force: bool,
    },

    /// Import settings from a JSON file
    Import { file: String },
}

#[derive(Subcommand)]
pub enum TasksAction {
    /// Export tasks
    Export {
        file: String,

        #[arg(long, value_enum, help = "Output format (default: from the file extension)")]
        format: Option<ExportFormat>,

        #[arg(long, help = "all, todo, started or completed (default: from config)")]
        status: Option<String>,

        #[arg(long, help = "Overwrite the output file if it exists")]
        force: bool,
    },

    /// Import tasks from a JSON or CSV file
    Import {
        file: String,

        #[arg(long, value_enum, help = "Duplicate names: skip, replace or keep-both (default: from config)")]
        policy: Option<DuplicatePolicy>,

        #[arg(long, help = "Also import indented '  - ' subtask rows")]
        subtasks: bool,
    },
}

use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::startup::boot;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Handle the `init` command
///
/// Creates the config directory and file (unless `--test`), then opens the
/// database, which builds the schema, runs data migrations and seeds the
/// defaults.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.as_deref(), cli.test)?;

    info("Initializing daytrack…");
    if !cli.test {
        info(format!("Config file : {}", Config::config_file().display()));
    }
    info(format!("Database    : {}", db_path.display()));

    let booted = boot(&db_path)?;
    success(format!(
        "Database initialized at {} (schema v{}, {} default rows)",
        db_path.display(),
        booted.db.user_version()?,
        booted.seed.total_inserted()
    ));
    Ok(())
}

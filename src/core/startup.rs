//! Application boot sequence: open, migrate, seed.

use crate::db::migrate::{MigrationReport, run_pending_migrations};
use crate::db::seed::{SeedReport, seed_defaults};
use crate::db::Database;
use crate::errors::AppResult;
use std::path::Path;
use tracing::warn;

pub struct Boot {
    pub db: Database,
    pub migrations: MigrationReport,
    pub seed: SeedReport,
}

/// Open the database and bring its data up to date.
///
/// Only the schema upgrade inside [`Database::open`] can fail the boot; data
/// migrations and seeding report their problems and the app carries on.
pub fn boot(path: impl AsRef<Path>) -> AppResult<Boot> {
    let db = Database::open(path)?;
    Ok(prepare(db))
}

pub fn boot_in_memory() -> AppResult<Boot> {
    Ok(prepare(Database::open_in_memory()?))
}

fn prepare(db: Database) -> Boot {
    let migrations = run_pending_migrations(&db);
    if !migrations.is_clean() {
        warn!(target: "daytrack::db", failed = ?migrations.failed, "running on a partially migrated database");
    }
    let seed = seed_defaults(&db);
    Boot {
        db,
        migrations,
        seed,
    }
}

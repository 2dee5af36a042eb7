use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::migrate::run_pending_migrations;
use crate::db::{Database, SCHEMA_VERSION, Store, Table};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, RED, RESET};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate,
        check,
        info,
    } = cmd
    {
        let db = Database::open(&cfg.database)?;

        //
        // 1) MIGRATE
        //
        if *migrate {
            println!("{}▶ Running migrations…{}", CYAN, RESET);
            let report = run_pending_migrations(&db);
            for v in &report.applied {
                println!("  applied  v{v}");
            }
            for (v, err) in &report.failed {
                println!("{}  failed   v{v}: {err}{}", RED, RESET);
            }
            println!(
                "{}✔ Migration completed ({} applied, {} already done).{}\n",
                GREEN,
                report.applied.len(),
                report.skipped.len(),
                RESET
            );
        }

        //
        // 2) INFO
        //
        if *info {
            print_info(&db, &cfg.database)?;
        }

        //
        // 3) CHECK
        //
        if *check {
            println!("{}▶ Running integrity check…{}", CYAN, RESET);

            let integrity: String = db
                .conn()
                .query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;

            if integrity == "ok" {
                println!("{}✔ Integrity check passed.{}\n", GREEN, RESET);
            } else {
                println!("{}✘ Integrity check failed:{} {}\n", RED, RESET, integrity);
            }
        }
    }

    Ok(())
}

fn print_info(db: &Database, path: &str) -> AppResult<()> {
    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    println!("🗄️  Database : {path}");
    println!("   Size     : {:.1} KiB", size as f64 / 1024.0);
    println!("   Schema   : v{} (build supports v{SCHEMA_VERSION})", db.user_version()?);
    println!();
    for table in Table::ALL {
        println!("   {:<18} {:>6}", table.name(), db.count(table)?);
    }
    println!();
    Ok(())
}

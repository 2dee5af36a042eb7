use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

pub fn handle(cfg: &Config) -> AppResult<()> {
    let booted = super::open(cfg)?;
    let report = &booted.seed;

    for (domain, n) in &report.inserted {
        if *n > 0 {
            info(format!("{domain}: {n} added"));
        }
    }
    for name in &report.reenabled {
        info(format!("Core metric '{name}' re-enabled"));
    }
    success(format!(
        "Defaults in place ({} added, {} domains already initialized).",
        report.total_inserted(),
        report.skipped.len()
    ));
    Ok(())
}

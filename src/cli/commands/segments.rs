use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::segments::SegmentLogic;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::colors::{CYAN, RESET};
use crate::utils::date::{now_hhmm, parse_time};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Segments { reset, at } = cmd {
        let booted = super::open(cfg)?;
        let db = &booted.db;

        if *reset {
            let fresh = SegmentLogic::reset(db)?;
            success(format!("Segments reset to the {} defaults.", fresh.len()));
        }

        if let Some(at) = at {
            let time = parse_time(at)?;
            match SegmentLogic::for_time(db, time)? {
                Some(s) => println!("{at} → {} ({} - {})", s.name, s.start_time, s.end_time),
                None => info(format!("No segment covers {at}")),
            }
            return Ok(());
        }

        let current = SegmentLogic::for_time(db, now_hhmm())?.map(|s| s.id);
        for s in SegmentLogic::list(db)? {
            let marker = if current.as_deref() == Some(s.id.as_str()) {
                format!("{CYAN}◀ now{RESET}")
            } else {
                String::new()
            };
            println!(
                "{:<16} {} - {}  ({:>3} min) {}",
                s.name,
                s.start_time,
                s.end_time,
                s.minutes()?,
                marker
            );
        }
    }
    Ok(())
}

use crate::cli::parser::{CheckinAction, Commands};
use crate::config::Config;
use crate::core::check_in::{CheckInLogic, Metrics};
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::utils::colors::colorize_metric;
use crate::utils::date::parse_date;
use chrono::{Local, Utc};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Checkin { action } = cmd else {
        return Ok(());
    };
    let booted = super::open(cfg)?;
    let db = &booted.db;

    match action {
        CheckinAction::Add {
            mood,
            energy,
            focus,
            stress,
            motivation,
            segment,
            notes,
        } => {
            let check_in = CheckInLogic::record(
                db,
                Utc::now(),
                segment.as_deref(),
                Metrics {
                    mood: *mood,
                    energy: *energy,
                    focus: *focus,
                    stress: *stress,
                    motivation: *motivation,
                },
                notes.clone(),
            )?;
            success(format!(
                "Check-in recorded for {} ({})",
                check_in.segment_name, check_in.date
            ));
        }
        CheckinAction::List { date } => {
            let date = parse_date(date)?;
            let rows = CheckInLogic::on_date(db, date)?;
            if rows.is_empty() {
                info(format!("No check-ins for {date}"));
            }
            for c in rows {
                println!(
                    "{} {:<16} mood {}  energy {}  focus {}  stress {}  motivation {}{}",
                    c.time.with_timezone(&Local).format("%H:%M"),
                    c.segment_name,
                    colorize_metric(c.mood, false),
                    colorize_metric(c.energy, false),
                    colorize_metric(c.focus, false),
                    colorize_metric(c.stress, true),
                    colorize_metric(c.motivation, false),
                    c.notes.map(|n| format!("  \"{n}\"")).unwrap_or_default()
                );
            }
        }
        CheckinAction::ClearTranscription { id } => {
            CheckInLogic::delete_transcription(db, id)?;
            success(format!("Transcription removed from {id}"));
        }
    }
    Ok(())
}

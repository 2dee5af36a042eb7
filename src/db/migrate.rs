//! Ordered migration registry.
//!
//! `Upgrade` steps run inside the IMMEDIATE transaction opened by
//! [`Database::open`] and are fatal on error: the version bump and the shape
//! change commit together or not at all. `Data` steps run after open, each
//! guarded by a `migratedToVersion{N}` setting written as the last statement
//! of its transaction; a failing data step is logged and skipped.

use crate::db::{Database, SCHEMA_VERSION, Store, Table, Tx};
use crate::errors::{AppError, AppResult};
use crate::hooks::FULL_COMPLETION_THRESHOLD;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationKind {
    Upgrade,
    Data,
}

pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub kind: MigrationKind,
    /// Tables the step may write (settings is always added for data steps).
    pub tables: &'static [Table],
    pub run: fn(&Tx<'_>) -> AppResult<()>,
}

/// Every migration, strictly ascending by version.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        name: "collapse_task_completions",
        kind: MigrationKind::Upgrade,
        tables: &[Table::Tasks, Table::TaskEntries],
        run: collapse_task_completions,
    },
    Migration {
        version: 3,
        name: "snapshot_segment_names",
        kind: MigrationKind::Upgrade,
        tables: &[Table::CheckIns],
        run: snapshot_segment_names,
    },
    Migration {
        version: 4,
        name: "sound_settings",
        kind: MigrationKind::Data,
        tables: &[Table::Settings],
        run: sound_settings,
    },
    Migration {
        version: 5,
        name: "theme_backgrounds",
        kind: MigrationKind::Data,
        tables: &[Table::Settings],
        run: theme_backgrounds,
    },
    Migration {
        version: 6,
        name: "timer_completion_values",
        kind: MigrationKind::Data,
        tables: &[Table::TimerSessions],
        run: timer_completion_values,
    },
    Migration {
        version: 7,
        name: "task_usage_stats",
        kind: MigrationKind::Data,
        tables: &[Table::Tasks],
        run: task_usage_stats,
    },
];

pub fn marker_key(version: i64) -> String {
    format!("migratedToVersion{version}")
}

/// Outcome of a post-open migration pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationReport {
    pub applied: Vec<i64>,
    pub skipped: Vec<i64>,
    pub failed: Vec<(i64, String)>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create every declared table and apply the upgrade steps newer than `from`,
/// then bump `user_version`, all in one transaction.
pub(crate) fn upgrade(db: &Database, from: i64) -> AppResult<()> {
    let tx = db.begin_upgrade()?;

    for table in Table::ALL {
        tx.conn().execute_batch(&table.ddl())?;
    }

    for m in MIGRATIONS
        .iter()
        .filter(|m| m.kind == MigrationKind::Upgrade && m.version > from)
    {
        info!(target: "daytrack::db", version = m.version, name = m.name, "running schema upgrade");
        (m.run)(&tx).map_err(|e| AppError::Upgrade {
            version: m.version,
            reason: e.to_string(),
        })?;
    }

    tx.conn()
        .pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()
}

/// True when the completion marker for `version` is set.
pub fn is_marked(store: &impl Store, version: i64) -> AppResult<bool> {
    Ok(matches!(
        store.get(Table::Settings, &marker_key(version))?,
        Some(doc) if doc.get("value") == Some(&Value::Bool(true))
    ))
}

/// Run one data migration. Returns `Ok(false)` when its marker was already
/// set, in which case nothing but the marker row is read.
pub fn run_data_migration(db: &Database, m: &Migration) -> AppResult<bool> {
    if is_marked(db, m.version)? {
        debug!(target: "daytrack::db", version = m.version, "migration already applied");
        return Ok(false);
    }

    let mut tables = m.tables.to_vec();
    if !tables.contains(&Table::Settings) {
        tables.push(Table::Settings);
    }

    db.transaction(&tables, |tx| {
        (m.run)(tx)?;
        tx.put(
            Table::Settings,
            &json!({ "key": marker_key(m.version), "value": true }),
        )?;
        Ok(())
    })?;

    info!(target: "daytrack::db", version = m.version, name = m.name, "data migration applied");
    Ok(true)
}

/// Apply every pending data migration in version order. Failures are logged
/// and reported; they never stop the pass.
pub fn run_pending_migrations(db: &Database) -> MigrationReport {
    let mut report = MigrationReport::default();

    for m in MIGRATIONS
        .iter()
        .filter(|m| m.kind == MigrationKind::Data)
    {
        match run_data_migration(db, m) {
            Ok(true) => report.applied.push(m.version),
            Ok(false) => report.skipped.push(m.version),
            Err(e) => {
                warn!(target: "daytrack::db", version = m.version, name = m.name, error = %e, "data migration failed, continuing");
                report.failed.push((m.version, e.to_string()));
            }
        }
    }

    report
}

// ---------------------------
// Upgrade steps
// ---------------------------

const LEGACY_COMPLETION_FIELDS: [&str; 5] = [
    "completed",
    "completedAt",
    "completionValue",
    "completionDate",
    "completionHistory",
];

fn legacy_timestamp(date: &str, raw: Option<&Value>) -> String {
    raw.and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|| format!("{date}T00:00:00+00:00"))
}

fn legacy_entry(task_id: &str, index: usize, src: &Value, fallback_date: Option<&str>) -> Option<Value> {
    let date = src
        .get("date")
        .or_else(|| src.get("completionDate"))
        .and_then(Value::as_str)
        .or_else(|| src.get("completedAt").and_then(Value::as_str).map(|s| s.get(..10).unwrap_or(s)))
        .or(fallback_date)?
        .to_string();

    let value = src
        .get("value")
        .or_else(|| src.get("completionValue"))
        .and_then(Value::as_f64)
        .unwrap_or(1.0)
        .clamp(0.0, 1.0);

    let time = legacy_timestamp(&date, src.get("time").or_else(|| src.get("completedAt")));

    Some(json!({
        "id": format!("{task_id}-legacy-{index}"),
        "taskId": task_id,
        "date": date,
        "time": time,
        "status": if value >= FULL_COMPLETION_THRESHOLD { "completed" } else { "partial" },
        "completionValue": value,
    }))
}

/// v2: tasks used to embed their completion state. Each recorded completion
/// becomes an append-only task entry and the embedded fields are dropped.
fn collapse_task_completions(tx: &Tx<'_>) -> AppResult<()> {
    for doc in tx.all(Table::Tasks)? {
        let Some(obj) = doc.as_object() else {
            continue;
        };
        if !LEGACY_COMPLETION_FIELDS.iter().any(|f| obj.contains_key(*f)) {
            continue;
        }
        let Some(task_id) = obj.get("id").and_then(Value::as_str) else {
            continue;
        };

        let completed = obj.get("completed").and_then(Value::as_bool).unwrap_or(false);
        let fallback_date = obj
            .get("updatedAt")
            .or_else(|| obj.get("createdAt"))
            .and_then(Value::as_str)
            .map(|s| s.get(..10).unwrap_or(s));

        let mut entries = Vec::new();
        match obj.get("completionHistory") {
            Some(Value::Array(history)) => {
                for (i, h) in history.iter().enumerate() {
                    entries.extend(legacy_entry(task_id, i, h, fallback_date));
                }
            }
            _ => {
                let value = obj.get("completionValue").and_then(Value::as_f64).unwrap_or(0.0);
                if completed || value > 0.0 {
                    entries.extend(legacy_entry(task_id, 0, &doc, fallback_date));
                }
            }
        }

        // deterministic ids: a re-run overwrites instead of duplicating
        for entry in &entries {
            tx.put(Table::TaskEntries, entry)?;
        }

        let mut patch = Map::new();
        for f in LEGACY_COMPLETION_FIELDS {
            patch.insert(f.to_string(), Value::Null);
        }
        if !obj.contains_key("status") {
            patch.insert(
                "status".into(),
                json!(if completed { "completed" } else { "todo" }),
            );
        }
        if !obj.contains_key("usageCount") {
            patch.insert("usageCount".into(), json!(entries.len()));
        }
        for stamp in ["createdAt", "updatedAt"] {
            if !obj.contains_key(stamp) {
                patch.insert(stamp.into(), json!(Utc::now().to_rfc3339()));
            }
        }
        if let Some(last) = entries
            .iter()
            .filter_map(|e| e.get("time").and_then(Value::as_str))
            .max()
        {
            patch.insert("lastUsed".into(), json!(last));
        }

        tx.update(Table::Tasks, task_id, &Value::Object(patch))?;
    }
    Ok(())
}

/// Neutral value used when a legacy check-in lacks one of the five metrics.
const NEUTRAL_METRIC: u64 = 5;

/// v3: check-ins carry a snapshot of their segment name and flat metrics.
fn snapshot_segment_names(tx: &Tx<'_>) -> AppResult<()> {
    let names: HashMap<String, String> = tx
        .all(Table::Segments)?
        .into_iter()
        .filter_map(|s| {
            Some((
                s.get("id")?.as_str()?.to_string(),
                s.get("name")?.as_str()?.to_string(),
            ))
        })
        .collect();

    for doc in tx.all(Table::CheckIns)? {
        let Some(obj) = doc.as_object() else {
            continue;
        };
        let Some(id) = obj.get("id").and_then(Value::as_str) else {
            continue;
        };

        let mut patch = Map::new();

        if !obj.contains_key("segmentName") {
            let name = obj
                .get("segmentId")
                .and_then(Value::as_str)
                .and_then(|sid| names.get(sid))
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string());
            patch.insert("segmentName".into(), json!(name));
        }

        let nested = obj.get("metrics").and_then(Value::as_object);
        for field in crate::models::check_in::CHECK_IN_METRICS {
            if obj.contains_key(field) {
                continue;
            }
            let v = nested
                .and_then(|m| m.get(field))
                .and_then(Value::as_u64)
                .unwrap_or(NEUTRAL_METRIC)
                .clamp(1, 10);
            patch.insert(field.to_string(), json!(v));
        }
        if nested.is_some() {
            patch.insert("metrics".into(), Value::Null);
        }

        if !patch.is_empty() {
            tx.update(Table::CheckIns, id, &Value::Object(patch))?;
        }
    }
    Ok(())
}

// ---------------------------
// Data steps
// ---------------------------

fn insert_setting_if_missing(tx: &Tx<'_>, key: &str, value: Value) -> AppResult<bool> {
    if tx.get(Table::Settings, key)?.is_some() {
        return Ok(false);
    }
    tx.put(Table::Settings, &json!({ "key": key, "value": value }))?;
    Ok(true)
}

fn sound_settings(tx: &Tx<'_>) -> AppResult<()> {
    insert_setting_if_missing(tx, "soundEnabled", json!(true))?;
    insert_setting_if_missing(tx, "soundVolume", json!(0.7))?;
    insert_setting_if_missing(tx, "timerEndSound", json!("chime"))?;
    insert_setting_if_missing(tx, "checkInReminderSound", json!("bell"))?;
    Ok(())
}

/// Theme-specific backgrounds start as copies of the global one; they are
/// only consulted while `useThemeBackgrounds` is true.
fn theme_backgrounds(tx: &Tx<'_>) -> AppResult<()> {
    let global = tx
        .get(Table::Settings, "backgroundImage")?
        .and_then(|d| d.get("value").cloned())
        .unwrap_or_else(|| json!(""));

    insert_setting_if_missing(tx, "useThemeBackgrounds", json!(false))?;
    insert_setting_if_missing(tx, "lightBackgroundImage", global.clone())?;
    insert_setting_if_missing(tx, "darkBackgroundImage", global)?;
    Ok(())
}

fn timer_completion_values(tx: &Tx<'_>) -> AppResult<()> {
    for doc in tx.all(Table::TimerSessions)? {
        if doc.get("completionValue").is_some() {
            continue;
        }
        let Some(id) = doc.get("id").and_then(Value::as_str) else {
            continue;
        };
        let pct = doc
            .get("completionPercentage")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        tx.update(
            Table::TimerSessions,
            id,
            &json!({ "completionValue": pct / 100.0 }),
        )?;
    }
    Ok(())
}

fn task_usage_stats(tx: &Tx<'_>) -> AppResult<()> {
    for doc in tx.all(Table::Tasks)? {
        let Some(id) = doc.get("id").and_then(Value::as_str) else {
            continue;
        };
        let has_count = doc.get("usageCount").is_some();
        let has_last = doc.get("lastUsed").is_some();
        if has_count && has_last {
            continue;
        }

        let entries = tx.where_eq(Table::TaskEntries, "taskId", &json!(id))?;
        if has_count && entries.is_empty() {
            continue;
        }

        let mut patch = Map::new();
        patch.insert("usageCount".into(), json!(entries.len()));
        if let Some(last) = entries
            .iter()
            .filter_map(|e| e.get("time").and_then(Value::as_str))
            .max()
        {
            patch.insert("lastUsed".into(), json!(last));
        }
        tx.update(Table::Tasks, id, &Value::Object(patch))?;
    }
    Ok(())
}

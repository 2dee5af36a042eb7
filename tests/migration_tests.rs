use daytrack::db::migrate::{MIGRATIONS, MigrationKind, is_marked, marker_key, run_pending_migrations};
use daytrack::db::{Database, SCHEMA_VERSION, Store};
use daytrack::errors::AppError;
use daytrack::models::{CheckIn, Setting, Task, TaskEntry, TaskStatus, TimerSession};
use rusqlite::Connection;
use serde_json::json;
use std::fs;
use std::path::Path;

mod common;
use common::{setup_test_db, test_dir, write_legacy_v1};

#[test]
fn second_pass_short_circuits_on_markers() {
    let db = common::seeded();
    db.pump();

    let report = run_pending_migrations(&db);
    let data_versions: Vec<i64> = MIGRATIONS
        .iter()
        .filter(|m| m.kind == MigrationKind::Data)
        .map(|m| m.version)
        .collect();

    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, data_versions);
    assert!(db.pending_changes().is_empty(), "a marked migration must not write");
}

#[test]
fn data_migrations_leave_markers_and_sound_defaults() {
    let db = Database::open_in_memory().unwrap();
    let report = run_pending_migrations(&db);
    assert_eq!(report.applied, vec![4, 5, 6, 7]);

    let settings = db.repo::<Setting>();
    for v in 4..=7 {
        assert_eq!(settings.get(&marker_key(v)).unwrap().unwrap().value, json!(true));
    }
    assert_eq!(settings.get("soundVolume").unwrap().unwrap().value, json!(0.7));
    assert_eq!(settings.get("timerEndSound").unwrap().unwrap().value, json!("chime"));
}

#[test]
fn failed_data_migration_is_retried_on_the_next_pass() {
    let db = Database::open_in_memory().unwrap();
    db.put(
        daytrack::db::Table::TimerSessions,
        &json!({ "id": "t1", "taskId": "x", "startTime": "2024-01-01T10:00:00Z", "completionPercentage": 25.0 }),
    )
    .unwrap();
    db.conn()
        .execute_batch(
            "CREATE TRIGGER freeze_sessions BEFORE UPDATE ON timer_sessions
             BEGIN SELECT RAISE(ABORT, 'sessions are read-only'); END;",
        )
        .unwrap();

    let first = run_pending_migrations(&db);
    assert_eq!(first.failed.len(), 1);
    assert_eq!(first.failed[0].0, 6);
    assert_eq!(first.applied, vec![4, 5, 7]);
    assert!(!is_marked(&db, 6).unwrap());
    assert!(is_marked(&db, 7).unwrap());
    let untouched = db.get(daytrack::db::Table::TimerSessions, "t1").unwrap().unwrap();
    assert!(untouched.get("completionValue").is_none());

    db.conn().execute_batch("DROP TRIGGER freeze_sessions;").unwrap();
    let second = run_pending_migrations(&db);
    assert!(second.failed.is_empty());
    assert_eq!(second.applied, vec![6]);
    assert_eq!(second.skipped, vec![4, 5, 7]);
    assert!(is_marked(&db, 6).unwrap());
    let s = db.repo::<TimerSession>().get("t1").unwrap().unwrap();
    assert_eq!(s.completion_value, 0.25);
}

#[test]
fn running_twice_gives_the_same_state() {
    let db = Database::open_in_memory().unwrap();
    db.put(
        daytrack::db::Table::TimerSessions,
        &json!({ "id": "t1", "taskId": "x", "startTime": "2024-01-01T10:00:00Z", "completionPercentage": 40.0 }),
    )
    .unwrap();

    run_pending_migrations(&db);
    let once = db.all(daytrack::db::Table::TimerSessions).unwrap();
    run_pending_migrations(&db);
    let twice = db.all(daytrack::db::Table::TimerSessions).unwrap();

    assert_eq!(once, twice);
    let s = db.repo::<TimerSession>().get("t1").unwrap().unwrap();
    assert_eq!(s.completion_value, 40.0 / 100.0);
}

#[test]
fn legacy_v1_file_is_upgraded() {
    let path = setup_test_db("legacy_v1_upgrade");
    write_legacy_v1(&path);

    let db = common::seeded_file(&path);
    assert_eq!(db.user_version().unwrap(), SCHEMA_VERSION);

    // v2: embedded completions became entries
    let task = db.repo::<Task>().get("task-legacy").unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.usage_count, 2);
    let mut entries = db.repo::<TaskEntry>().find_by("taskId", "task-legacy").unwrap();
    entries.sort_by_key(|e| e.date);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].date.to_string(), "2024-03-01");
    assert_eq!(entries[1].completion_value, 1.0);

    let raw = db.get(daytrack::db::Table::Tasks, "task-legacy").unwrap().unwrap();
    assert!(raw.get("completionHistory").is_none());
    assert!(raw.get("completed").is_none());

    let fresh = db.repo::<Task>().get("task-fresh").unwrap().unwrap();
    assert_eq!(fresh.status, TaskStatus::Todo);
    assert!(db.repo::<TaskEntry>().find_by("taskId", "task-fresh").unwrap().is_empty());

    // v3: segment name snapshot and flattened metrics
    let ci = db.repo::<CheckIn>().get("ci-1").unwrap().unwrap();
    assert_eq!(ci.segment_name, "Morning");
    assert_eq!((ci.mood, ci.energy, ci.focus, ci.stress), (8, 6, 7, 3));
    assert_eq!(ci.motivation, 5);

    // v5: theme images copied from the global background
    let light = db.repo::<Setting>().get("lightBackgroundImage").unwrap().unwrap();
    assert_eq!(light.value, json!("beach.jpg"));
}

#[test]
fn upgrade_writes_a_zip_backup_next_to_the_file() {
    let dir = test_dir("legacy_backup");
    let path = dir.join("daytrack.sqlite");
    write_legacy_v1(&path.to_string_lossy());

    let _db = Database::open(&path).unwrap();

    let backups: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with("-backup_db_pre_v1.zip"))
        .collect();
    assert_eq!(backups.len(), 1, "{backups:?}");
}

#[test]
fn fresh_file_needs_no_backup() {
    let dir = test_dir("fresh_no_backup");
    let _db = Database::open(dir.join("daytrack.sqlite")).unwrap();
    let zips = fs::read_dir(&dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "zip"))
        .count();
    assert_eq!(zips, 0);
}

#[test]
fn newer_schema_on_disk_is_fatal() {
    let path = setup_test_db("schema_too_new");
    {
        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();
    }

    let err = Database::open(&path).err().expect("must refuse");
    assert!(matches!(err, AppError::SchemaTooNew { found, .. } if found == SCHEMA_VERSION + 1));
    assert!(err.is_fatal());
}

#[test]
fn upgrade_blocked_by_another_connection_is_fatal() {
    let path = setup_test_db("version_blocked");
    write_legacy_v1(&path);

    let holder = Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let err = Database::open(Path::new(&path)).err().expect("must be blocked");
    assert!(matches!(err, AppError::VersionBlocked(_)), "{err}");
    assert!(err.is_fatal());

    holder.execute_batch("ROLLBACK;").unwrap();
    let db = Database::open(&path).unwrap();
    assert_eq!(db.user_version().unwrap(), SCHEMA_VERSION);
}

#[test]
fn current_file_opens_without_upgrade_even_when_locked() {
    let path = setup_test_db("current_locked");
    common::seeded_file(&path).close().unwrap();

    let holder = Connection::open(&path).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    let db = Database::open(&path).unwrap();
    assert_eq!(db.user_version().unwrap(), SCHEMA_VERSION);
    holder.execute_batch("ROLLBACK;").unwrap();
}

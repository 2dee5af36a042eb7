#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use daytrack::core::startup::boot;
use daytrack::db::Database;
use rusqlite::Connection;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// The binary, with its config directory pointed at `home` so no real
/// configuration file is read or written.
pub fn dt(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("daytrack");
    cmd.env("DAYTRACK_HOME", home).env_remove("RUST_LOG");
    cmd
}

/// Fresh, empty directory for one test inside the system temp dir.
pub fn test_dir(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push("daytrack_tests");
    path.push(name);
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("create test dir");
    path
}

/// Unique test DB path; any previous file is removed with its directory.
pub fn setup_test_db(name: &str) -> String {
    test_dir(name)
        .join("daytrack.sqlite")
        .to_string_lossy()
        .to_string()
}

/// Temporary output file path next to the test DB.
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push("daytrack_tests");
    fs::create_dir_all(&path).expect("create temp dir");
    path.push(format!("{name}_out.{ext}"));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// Booted (migrated + seeded) in-memory database.
pub fn seeded() -> Database {
    daytrack::core::startup::boot_in_memory()
        .expect("boot in memory")
        .db
}

/// Booted database file.
pub fn seeded_file(path: &str) -> Database {
    boot(path).expect("boot").db
}

fn raw_table(conn: &Connection, name: &str, docs: &[Value]) {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {name} (id TEXT PRIMARY KEY, doc TEXT NOT NULL);"
    ))
    .expect("create legacy table");
    for doc in docs {
        let id = doc
            .get("id")
            .or_else(|| doc.get("key"))
            .and_then(Value::as_str)
            .expect("legacy doc id");
        conn.execute(
            &format!("INSERT INTO {name} (id, doc) VALUES (?1, ?2)"),
            rusqlite::params![id, doc.to_string()],
        )
        .expect("insert legacy doc");
    }
}

/// A version 1 database file: tasks still embed their completion state and
/// check-ins carry nested metrics without a segment name.
pub fn write_legacy_v1(path: &str) {
    let conn = Connection::open(path).expect("open legacy db");
    raw_table(
        &conn,
        "segments",
        &[json!({ "id": "seg-morning", "name": "Morning", "startTime": "09:00", "endTime": "12:00", "color": "#fff" })],
    );
    raw_table(
        &conn,
        "tasks",
        &[
            json!({
                "id": "task-legacy",
                "name": "Water plants",
                "type": "standard",
                "completed": true,
                "completedAt": "2024-03-02T08:30:00Z",
                "completionHistory": [
                    { "date": "2024-03-01", "value": 1.0, "time": "2024-03-01T08:00:00Z" },
                    { "date": "2024-03-02", "value": 1.0, "time": "2024-03-02T08:30:00Z" }
                ],
                "createdAt": "2024-02-01T00:00:00Z",
                "updatedAt": "2024-03-02T08:30:00Z"
            }),
            json!({
                "id": "task-fresh",
                "name": "Stretch",
                "type": "timer",
                "completed": false,
                "createdAt": "2024-02-01T00:00:00Z",
                "updatedAt": "2024-02-01T00:00:00Z"
            }),
        ],
    );
    raw_table(
        &conn,
        "check_ins",
        &[json!({
            "id": "ci-1",
            "date": "2024-03-01",
            "time": "2024-03-01T10:00:00Z",
            "segmentId": "seg-morning",
            "metrics": { "mood": 8, "energy": 6, "focus": 7, "stress": 3 }
        })],
    );
    raw_table(&conn, "task_entries", &[]);
    raw_table(&conn, "settings", &[json!({ "key": "backgroundImage", "value": "beach.jpg" })]);
    conn.pragma_update(None, "user_version", 1)
        .expect("set legacy version");
}

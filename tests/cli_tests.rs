use predicates::str::contains;
use std::fs;
use std::path::{Path, PathBuf};

mod common;

/// Config home + database path for one test, with `init` already run.
fn init(name: &str) -> (PathBuf, String) {
    let db_path = common::setup_test_db(name);
    let home = Path::new(&db_path)
        .parent()
        .expect("test dir")
        .join("home");

    common::dt(&home)
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"))
        .stdout(contains("schema v3"));

    (home, db_path)
}

#[test]
fn init_creates_a_seeded_database() {
    let (home, db_path) = init("cli_init");
    assert!(Path::new(&db_path).exists());
    assert!(!home.join("daytrack.conf").exists(), "--test must not write a config file");

    common::dt(&home)
        .args(["--db", &db_path, "segments"])
        .assert()
        .success()
        .stdout(contains("Morning"))
        .stdout(contains("Night"));
}

#[test]
fn segment_lookup_wraps_past_midnight() {
    let (home, db) = init("cli_segment_at");

    common::dt(&home)
        .args(["--db", &db, "segments", "--at", "23:30"])
        .assert()
        .success()
        .stdout(contains("Night"));

    common::dt(&home)
        .args(["--db", &db, "segments", "--at", "02:15"])
        .assert()
        .success()
        .stdout(contains("Night"));

    common::dt(&home)
        .args(["--db", &db, "segments", "--at", "25:00"])
        .assert()
        .failure();
}

#[test]
fn task_move_between_segments() {
    let (home, db) = init("cli_task_move");
    common::dt(&home)
        .args(["--db", &db, "task", "add", "Journal"])
        .assert()
        .success();

    common::dt(&home)
        .args(["--db", &db, "task", "move", "Journal", "--segment", "evening"])
        .assert()
        .success()
        .stdout(contains("moved to Evening"));

    common::dt(&home)
        .args(["--db", &db, "task", "move", "Journal"])
        .assert()
        .success()
        .stdout(contains("no preferred segment"));
}

#[test]
fn task_add_toggle_and_list() {
    let (home, db) = init("cli_tasks");

    common::dt(&home)
        .args(["--db", &db, "task", "add", "Read a book", "--type", "tally", "--category", "Personal"])
        .assert()
        .success()
        .stdout(contains("Task 'Read a book' created"));

    common::dt(&home)
        .args(["--db", &db, "task", "toggle", "read a book", "--value", "0.5", "--date", "2026-03-01"])
        .assert()
        .success()
        .stdout(contains("on 2026-03-01: 50%"));

    common::dt(&home)
        .args(["--db", &db, "task", "toggle", "Read a book", "--value", "0.5", "--date", "2026-03-01"])
        .assert()
        .success()
        .stdout(contains("100%"));

    common::dt(&home)
        .args(["--db", &db, "task", "toggle", "Read a book", "--date", "2026-03-01"])
        .assert()
        .success()
        .stdout(contains("cleared"));

    common::dt(&home)
        .args(["--db", &db, "task", "list"])
        .assert()
        .success()
        .stdout(contains("Read a book"))
        .stdout(contains("tally"));

    common::dt(&home)
        .args(["--db", &db, "task", "stats", "Read a book"])
        .assert()
        .success()
        .stdout(contains("usage count : 1"));
}

#[test]
fn toggle_rejects_out_of_range_values() {
    let (home, db) = init("cli_toggle_range");
    common::dt(&home)
        .args(["--db", &db, "task", "add", "Walk"])
        .assert()
        .success();

    common::dt(&home)
        .args(["--db", &db, "task", "toggle", "Walk", "--value", "1.5"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("completion value must be in (0, 1]"));
}

#[test]
fn unknown_task_fails() {
    let (home, db) = init("cli_unknown_task");
    common::dt(&home)
        .args(["--db", &db, "task", "archive", "No such task"])
        .assert()
        .failure();
}

#[test]
fn checkin_in_a_named_segment() {
    let (home, db) = init("cli_checkin");

    common::dt(&home)
        .args([
            "--db", &db, "checkin", "add", "--mood", "7", "--energy", "6", "--focus", "8",
            "--stress", "3", "--motivation", "9", "--segment", "morning", "--notes", "slept well",
        ])
        .assert()
        .success()
        .stdout(contains("Check-in recorded for Morning"));

    common::dt(&home)
        .args(["--db", &db, "checkin", "list"])
        .assert()
        .success()
        .stdout(contains("slept well"));

    common::dt(&home)
        .args(["--db", &db, "checkin", "clear-transcription", "ci-missing"])
        .assert()
        .failure()
        .stderr(contains("ci-missing"));

    common::dt(&home)
        .args([
            "--db", &db, "checkin", "add", "--mood", "11", "--energy", "6", "--focus", "8",
            "--stress", "3", "--motivation", "9",
        ])
        .assert()
        .failure();
}

#[test]
fn settings_set_get_export_import() {
    let (home, db) = init("cli_settings");
    let out = common::temp_out("cli_settings", "json");

    common::dt(&home)
        .args(["--db", &db, "settings", "export", &out, "--force"])
        .assert()
        .success()
        .stdout(contains("export completed"));

    common::dt(&home)
        .args(["--db", &db, "settings", "set", "theme", "dark"])
        .assert()
        .success()
        .stdout(contains("theme = \"dark\""));

    common::dt(&home)
        .args(["--db", &db, "settings", "set", "theme", "dark"])
        .assert()
        .success()
        .stdout(contains("already is"));

    common::dt(&home)
        .args(["--db", &db, "settings", "import", &out])
        .assert()
        .success()
        .stdout(contains("Settings imported"));

    common::dt(&home)
        .args(["--db", &db, "settings", "get", "theme"])
        .assert()
        .success()
        .stdout(contains("\"system\""));
}

#[test]
fn tasks_export_and_import_with_subtasks() {
    let (home, db) = init("cli_tasks_io");
    let csv = common::temp_out("cli_tasks_io", "csv");
    fs::write(&csv, "Name,Status\nBuy milk,todo\n  - pick 2%,todo\n").expect("write csv");

    common::dt(&home)
        .args(["--db", &db, "tasks", "import", &csv, "--subtasks"])
        .assert()
        .success()
        .stdout(contains("1 tasks, 1 subtasks"));

    common::dt(&home)
        .args(["--db", &db, "tasks", "import", &csv, "--subtasks"])
        .assert()
        .success()
        .stdout(contains("0 tasks, 0 subtasks, 2 skipped"));

    let md = common::temp_out("cli_tasks_io", "md");
    common::dt(&home)
        .args(["--db", &db, "tasks", "export", &md, "--status", "todo", "--force"])
        .assert()
        .success()
        .stdout(contains("markdown"));

    let text = fs::read_to_string(&md).expect("read export");
    assert!(text.contains("- [ ] **Buy milk**"));
    assert!(text.contains("  - [ ] pick 2%"));
}

#[test]
fn export_without_known_extension_needs_a_format() {
    let (home, db) = init("cli_tasks_format");
    let out = common::temp_out("cli_tasks_format", "xyz");

    common::dt(&home)
        .args(["--db", &db, "tasks", "export", &out])
        .assert()
        .failure();

    common::dt(&home)
        .args(["--db", &db, "tasks", "export", &out, "--format", "json"])
        .assert()
        .success();
    assert!(fs::read_to_string(&out).expect("read export").starts_with('['));
}

#[test]
fn db_info_check_and_migrate() {
    let (home, db) = init("cli_db");

    common::dt(&home)
        .args(["--db", &db, "db", "--info"])
        .assert()
        .success()
        .stdout(contains("Schema   : v3"))
        .stdout(contains("segments"));

    common::dt(&home)
        .args(["--db", &db, "db", "--check"])
        .assert()
        .success()
        .stdout(contains("Integrity check passed"));

    common::dt(&home)
        .args(["--db", &db, "db", "--migrate"])
        .assert()
        .success();
}

#[test]
fn newer_database_exits_with_a_fatal_code() {
    let db_path = common::setup_test_db("cli_too_new");
    let home = Path::new(&db_path).parent().expect("test dir").join("home");
    {
        let conn = rusqlite::Connection::open(&db_path).expect("open");
        conn.pragma_update(None, "user_version", 99).expect("bump version");
    }

    common::dt(&home)
        .args(["--db", &db_path, "segments"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn init_without_test_writes_the_config_file() {
    let dir = common::test_dir("cli_config");
    let home = dir.join("home");

    common::dt(&home)
        .args(["init"])
        .assert()
        .success()
        .stdout(contains("Config file"));
    assert!(home.join("daytrack.conf").exists());
    assert!(home.join("daytrack.sqlite").exists());

    common::dt(&home)
        .args(["config", "--check", "--print"])
        .assert()
        .success()
        .stdout(contains("Configuration file is complete"))
        .stdout(contains("import_policy: skip"));

    common::dt(&home)
        .args(["seed"])
        .assert()
        .success()
        .stdout(contains("0 added, 7 domains already initialized"));
}

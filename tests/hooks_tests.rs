use chrono::NaiveDate;
use daytrack::core::check_in::{CheckInLogic, Metrics};
use daytrack::core::tasks::TaskLogic;
use daytrack::db::{Database, Store};
use daytrack::hooks::completion::toggle_task_completion;
use daytrack::hooks::timer::update_timer_session;
use daytrack::hooks::{
    CollectionHook, Optimistic, SettingsHook, TaskCompletionHook, TimerPatch, TimerSessionsHook,
    ToggleOutcome,
};
use daytrack::models::{Category, CheckIn, Setting, Task, TaskEntry, TaskType, TimerSession};
use serde_json::json;
use std::rc::Rc;

mod common;

fn shared() -> Rc<Database> {
    Rc::new(common::seeded())
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

// ---------------------------
// Settings
// ---------------------------

#[test]
fn settings_update_is_visible_before_any_io() {
    let db = shared();
    let mut hook = SettingsHook::new(Rc::clone(&db));
    assert!(hook.value().is_none());
    db.pump();
    assert_eq!(hook.get("theme"), Some(json!("system")));

    assert!(hook.set("theme", "dark"));
    assert_eq!(hook.get("theme"), Some(json!("dark")));
    assert_eq!(
        db.repo::<Setting>().get("theme").unwrap().unwrap().value,
        json!("system"),
        "nothing written before settle"
    );

    hook.settle().unwrap();
    assert_eq!(
        db.repo::<Setting>().get("theme").unwrap().unwrap().value,
        json!("dark")
    );
    assert!(hook.error().is_none());
    assert!(!hook.is_loading());
}

#[test]
fn setting_the_same_value_writes_nothing() {
    let db = shared();
    let mut hook = SettingsHook::new(Rc::clone(&db));
    db.pump();
    assert!(!hook.set("theme", "system"));
}

#[test]
fn failed_write_reverts_to_the_latest_delivered_value() {
    let db = shared();
    let mut hook = SettingsHook::new(Rc::clone(&db));
    db.pump();
    assert_eq!(hook.get("theme"), Some(json!("system")));

    hook.set("theme", "dark");

    // another writer changes the row while ours is in flight
    db.repo::<Setting>()
        .put(&Setting::new("theme", "solarized"))
        .unwrap();
    db.pump();

    db.set_read_only(true).unwrap();
    let err = hook.settle();
    db.set_read_only(false).unwrap();

    assert!(err.is_err());
    assert_eq!(hook.get("theme"), Some(json!("solarized")));
    assert!(hook.error().is_some());
}

// ---------------------------
// Collections
// ---------------------------

#[test]
fn collection_hook_add_update_remove() {
    let db = shared();
    let mut hook: CollectionHook<Category> = CollectionHook::new(Rc::clone(&db));
    db.pump();
    assert_eq!(hook.value().unwrap().len(), 5);

    let new = Category {
        id: "cat-x".into(),
        name: "Music".into(),
        color: "#111".into(),
        icon: None,
    };
    assert!(hook.add(new));
    assert_eq!(hook.value().unwrap().len(), 6);
    hook.settle().unwrap();

    assert!(hook.update("cat-x", json!({ "color": "#222" })).unwrap());
    assert_eq!(hook.value().unwrap().last().unwrap().color, "#222");
    hook.settle().unwrap();
    assert_eq!(db.repo::<Category>().get("cat-x").unwrap().unwrap().color, "#222");

    assert!(hook.update("nope", json!({})).is_err());

    assert!(hook.remove("cat-x"));
    hook.settle().unwrap();
    assert!(db.repo::<Category>().get("cat-x").unwrap().is_none());
    assert_eq!(hook.value().unwrap().len(), 5);
}

#[test]
fn optimistic_core_tracks_pending_writes_and_last_delivery() {
    let db = shared();
    let mut opt = Optimistic::new(Rc::clone(&db), (), |db: &Database, _: &()| {
        db.repo::<Category>().count()
    });
    db.pump();
    assert_eq!(opt.last_known_good(), Some(&5));

    let music = Category {
        id: "cat-m".into(),
        name: "Music".into(),
        color: "#111".into(),
        icon: None,
    };
    assert!(opt.apply(6, move |db| db.repo::<Category>().add(&music)));
    assert_eq!(opt.pending_writes(), 1);
    assert_eq!(opt.value(), Some(&6));
    assert_eq!(opt.last_known_good(), Some(&5));

    opt.settle().unwrap();
    assert_eq!(opt.pending_writes(), 0);
    assert_eq!(opt.last_known_good(), Some(&6));
}

#[test]
fn replace_all_skips_structurally_equal_lists() {
    let db = shared();
    let mut hook: CollectionHook<Category> = CollectionHook::new(Rc::clone(&db));
    db.pump();

    let same = hook.value().unwrap().clone();
    assert!(!hook.replace_all(same.clone()));

    let mut reordered = same;
    reordered.reverse();
    assert!(hook.replace_all(reordered.clone()));
    hook.settle().unwrap();
    assert_eq!(db.repo::<Category>().list().unwrap(), reordered);
}

// ---------------------------
// Timer sessions
// ---------------------------

#[test]
fn completion_value_follows_completion_percentage() {
    let db = shared();
    let task = TaskLogic::create(&db, "Focus", TaskType::Timer, None, None).unwrap();
    let mut hook = TimerSessionsHook::new(Rc::clone(&db), task.id.clone());
    db.pump();

    let session = hook.start(None);
    hook.settle().unwrap();

    for p in [0.0, 12.5, 33.0, 57.3, 100.0] {
        hook.update(
            &session.id,
            TimerPatch {
                completion_percentage: Some(p),
                ..Default::default()
            },
        )
        .unwrap();
        hook.settle().unwrap();
        let stored = db.repo::<TimerSession>().get(&session.id).unwrap().unwrap();
        assert_eq!(stored.completion_value, p / 100.0);
    }

    // explicit value wins
    update_timer_session(
        &*db,
        &session.id,
        TimerPatch {
            completion_percentage: Some(50.0),
            completion_value: Some(0.25),
            ..Default::default()
        },
    )
    .unwrap();
    let stored = db.repo::<TimerSession>().get(&session.id).unwrap().unwrap();
    assert_eq!(stored.completion_value, 0.25);
}

#[test]
fn continued_session_links_back_and_mood_reaches_check_in() {
    let db = shared();
    let task = TaskLogic::create(&db, "Read", TaskType::Timer, None, None).unwrap();
    let check_in = CheckInLogic::record(
        &db,
        chrono::Utc::now(),
        Some("Morning"),
        Metrics {
            mood: 5,
            energy: 5,
            focus: 5,
            stress: 5,
            motivation: 5,
        },
        None,
    )
    .unwrap();

    let mut hook = TimerSessionsHook::new(Rc::clone(&db), task.id.clone());
    db.pump();
    let first = hook.start(Some(check_in.id.clone()));
    hook.update(
        &first.id,
        TimerPatch {
            completion_percentage: Some(40.0),
            ..Default::default()
        },
    )
    .unwrap();
    hook.settle().unwrap();

    let second = hook.continue_session(&first.id).unwrap();
    assert_eq!(second.previous_session_id.as_deref(), Some(first.id.as_str()));
    assert_eq!(second.completion_value, 0.4);
    hook.settle().unwrap();

    hook.set_mood(&second.id, 9).unwrap();
    hook.settle().unwrap();
    assert_eq!(db.repo::<CheckIn>().get(&check_in.id).unwrap().unwrap().mood, 9);

    assert!(hook.set_mood(&second.id, 11).is_err());
    assert_eq!(hook.value().unwrap().len(), 2);
}

#[test]
fn finished_session_cannot_be_continued() {
    let db = shared();
    let mut hook = TimerSessionsHook::new(Rc::clone(&db), "task-x");
    db.pump();
    let s = hook.start(None);
    hook.update(
        &s.id,
        TimerPatch {
            completion_percentage: Some(100.0),
            ..Default::default()
        },
    )
    .unwrap();
    hook.settle().unwrap();
    assert!(hook.continue_session(&s.id).is_err());
}

#[test]
fn timer_hook_follows_another_task() {
    let db = shared();
    let mut hook = TimerSessionsHook::new(Rc::clone(&db), "task-a");
    db.pump();
    hook.start(None);
    hook.settle().unwrap();
    assert_eq!(hook.value().unwrap().len(), 1);

    hook.set_task("task-b");
    db.pump();
    assert!(hook.value().unwrap().is_empty());
    assert_eq!(hook.start(None).task_id, "task-b");
}

// ---------------------------
// Completion toggling
// ---------------------------

#[test]
fn tally_toggle_walks_create_update_clamp_delete() {
    let db = common::seeded();
    let task = TaskLogic::create(&db, "Water", TaskType::Tally, None, None).unwrap();
    let entries = |db: &Database| db.repo::<TaskEntry>().find_by("taskId", task.id.as_str()).unwrap();

    assert_eq!(
        toggle_task_completion(&db, &task.id, day(), 0.4).unwrap(),
        ToggleOutcome::Created(0.4)
    );
    assert_eq!(entries(&db).len(), 1);
    assert_eq!(entries(&db)[0].completion_value, 0.4);

    toggle_task_completion(&db, &task.id, day(), 0.4).unwrap();
    assert_eq!(entries(&db)[0].completion_value, 0.8);

    toggle_task_completion(&db, &task.id, day(), 0.4).unwrap();
    assert_eq!(entries(&db).len(), 1);
    assert_eq!(entries(&db)[0].completion_value, 1.0);

    assert_eq!(
        toggle_task_completion(&db, &task.id, day(), 0.4).unwrap(),
        ToggleOutcome::Removed
    );
    assert!(entries(&db).is_empty());

    let task = db.repo::<Task>().get(&task.id).unwrap().unwrap();
    assert_eq!(task.usage_count, 1);
    assert!(task.last_used.is_some());
}

#[test]
fn completion_hook_mirrors_toggles() {
    let db = shared();
    let task = TaskLogic::create(&db, "Walk", TaskType::Standard, None, None).unwrap();
    let mut hook = TaskCompletionHook::new(Rc::clone(&db), day());
    db.pump();
    assert_eq!(hook.completion_of(&task.id), None);

    assert_eq!(hook.toggle(&task.id, 1.0), ToggleOutcome::Created(1.0));
    assert_eq!(hook.completion_of(&task.id), Some(1.0));
    hook.settle().unwrap();
    assert_eq!(hook.completion_of(&task.id), Some(1.0));

    assert_eq!(hook.toggle(&task.id, 1.0), ToggleOutcome::Removed);
    assert_eq!(hook.completion_of(&task.id), None);
    hook.settle().unwrap();
    assert!(db.repo::<TaskEntry>().find_by("taskId", task.id.as_str()).unwrap().is_empty());

    hook.set_date(day().succ_opt().unwrap());
    db.pump();
    assert_eq!(hook.value().unwrap().len(), 0);
}

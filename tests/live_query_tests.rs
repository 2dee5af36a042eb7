use daytrack::db::{Database, Store, Table};
use daytrack::errors::AppError;
use daytrack::models::{Category, CheckIn, Segment};
use std::cell::Cell;
use std::rc::Rc;

mod common;

fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.into(),
        name: name.into(),
        color: "#000".into(),
        icon: None,
    }
}

fn names(db: &Database) -> Result<Vec<String>, AppError> {
    Ok(db
        .repo::<Category>()
        .list()?
        .into_iter()
        .map(|c| c.name)
        .collect())
}

#[test]
fn value_is_none_until_first_pump() {
    let db = Database::open_in_memory().unwrap();
    let q = db.live((), |db, _| db.repo::<Category>().count());
    assert!(q.current().is_none());
    assert!(q.is_loading());

    db.pump();
    assert_eq!(q.current(), Some(0));
    assert!(!q.is_loading());
}

#[test]
fn one_write_reaches_every_subscriber() {
    let db = Database::open_in_memory().unwrap();
    let count = db.live((), |db, _| db.repo::<Category>().count());
    let list = db.live((), |db, _| names(db));
    db.pump();

    db.repo::<Category>().add(&category("c1", "Work")).unwrap();
    db.pump();

    assert_eq!(count.current(), Some(1));
    assert_eq!(list.current(), Some(vec!["Work".to_string()]));
}

#[test]
fn many_writes_rerun_each_query_once() {
    let db = Database::open_in_memory().unwrap();
    let runs = Rc::new(Cell::new(0));
    let seen = Rc::clone(&runs);
    let _q = db.live((), move |db, _| {
        seen.set(seen.get() + 1);
        db.repo::<Category>().count()
    });
    let _other = db.live((), |db, _| db.repo::<Segment>().count());
    db.pump();
    assert_eq!(runs.get(), 1);

    for i in 0..5 {
        db.repo::<Category>()
            .add(&category(&format!("c{i}"), &format!("C{i}")))
            .unwrap();
    }
    assert_eq!(db.pump(), 1, "only the categories query is stale");
    assert_eq!(runs.get(), 2);

    assert_eq!(db.pump(), 0);
}

#[test]
fn writes_to_unrelated_tables_do_not_rerun() {
    let db = Database::open_in_memory().unwrap();
    let q = db.live((), |db, _| db.repo::<Category>().count());
    db.pump();
    let generation = q.generation();

    db.repo::<Segment>().bulk_replace(&[]).unwrap();
    db.pump();
    assert_eq!(q.generation(), generation);
}

#[test]
fn dropped_handle_gets_no_more_updates() {
    let db = Database::open_in_memory().unwrap();
    let runs = Rc::new(Cell::new(0));
    let seen = Rc::clone(&runs);
    let q = db.live((), move |db, _| {
        seen.set(seen.get() + 1);
        db.repo::<Category>().count()
    });
    db.pump();
    assert_eq!(db.subscription_count(), 1);

    q.dispose();
    assert_eq!(db.subscription_count(), 0);

    db.repo::<Category>().add(&category("c1", "Work")).unwrap();
    assert_eq!(db.pump(), 0);
    assert_eq!(runs.get(), 1);
}

#[test]
fn changing_deps_reruns_with_the_new_value() {
    let db = common::seeded();
    let q = db.live("Morning".to_string(), |db, name: &String| {
        Ok(db
            .repo::<Segment>()
            .find_by("name", name.as_str())?
            .into_iter()
            .map(|s| s.start_time)
            .next())
    });
    db.pump();
    assert_eq!(q.current(), Some(Some("09:00".to_string())));

    q.set_deps("Morning".to_string());
    assert_eq!(db.pump(), 0, "equal deps do not re-run");

    q.set_deps("Evening".to_string());
    assert_eq!(db.pump(), 1);
    assert_eq!(q.current(), Some(Some("18:00".to_string())));
}

#[test]
fn dependencies_follow_the_tables_actually_read() {
    let db = common::seeded();
    // reads check-ins only when asked to
    let q = db.live(false, |db, with_check_ins: &bool| {
        let mut n = db.repo::<Segment>().count()?;
        if *with_check_ins {
            n += db.repo::<CheckIn>().count()?;
        }
        Ok(n)
    });
    db.pump();

    db.put(Table::CheckIns, &serde_json::json!({ "id": "x" })).unwrap();
    assert_eq!(db.pump(), 0);

    q.set_deps(true);
    db.pump();
    db.delete(Table::CheckIns, "x").unwrap();
    assert_eq!(db.pump(), 1);
}

#[test]
fn failing_query_keeps_the_previous_value() {
    let db = Database::open_in_memory().unwrap();
    let q = db.live((), |db, _| {
        let n = db.repo::<Category>().count()?;
        if n > 1 {
            return Err(AppError::Other("too many".into()));
        }
        Ok(n)
    });
    db.pump();
    db.repo::<Category>().add(&category("c1", "A")).unwrap();
    db.pump();
    assert_eq!(q.current(), Some(1));

    db.repo::<Category>().add(&category("c2", "B")).unwrap();
    db.pump();
    assert_eq!(q.current(), Some(1));
    assert!(q.error().is_some());
}

//! Idempotent default-data seeding.
//!
//! Each domain is guarded twice: an `...Initialized` setting short-circuits
//! the whole domain, and items are matched by case-insensitive name so an
//! existing row is never duplicated or modified. A failing item is logged and
//! the pass moves on; the flag is only set when every item of the domain
//! made it, so the rest is retried on the next boot.

use crate::db::defaults::{self, CORE_METRICS, EXAMPLE_COLLECTION};
use crate::db::{Database, Entity, Store, Table};
use crate::errors::AppResult;
use crate::models::{
    Category, Collection, Metric, Segment, Setting, SubtaskTemplate, Task, TaskCollection,
    TaskTemplate,
};
use crate::utils::id::new_id;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

pub const SEGMENTS_FLAG: &str = "segmentsInitialized";
pub const METRICS_FLAG: &str = "metricsInitialized";
pub const SETTINGS_FLAG: &str = "settingsInitialized";
pub const CATEGORIES_FLAG: &str = "categoriesInitialized";
pub const COLLECTIONS_FLAG: &str = "collectionsInitialized";
pub const TEMPLATES_FLAG: &str = "templatesInitialized";
pub const EXAMPLE_TASK_FLAG: &str = "exampleTaskInitialized";
/// Set before the first default segment goes in; tells a retry apart from
/// user-defined segments.
pub const SEGMENTS_STARTED: &str = "segmentsSeedStarted";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SeedReport {
    /// Rows inserted per domain.
    pub inserted: BTreeMap<&'static str, usize>,
    /// Domains skipped through their initialized flag.
    pub skipped: Vec<&'static str>,
    /// (item, error) for every insert that failed.
    pub failed: Vec<(String, String)>,
    /// Core metrics that had been disabled and were switched back on.
    pub reenabled: Vec<String>,
}

impl SeedReport {
    pub fn total_inserted(&self) -> usize {
        self.inserted.values().sum()
    }
}

pub fn flag_is_set(db: &Database, flag: &str) -> AppResult<bool> {
    Ok(db
        .repo::<Setting>()
        .get(flag)?
        .is_some_and(|s| s.value == Value::Bool(true)))
}

fn set_flag(db: &Database, flag: &str) -> AppResult<()> {
    db.repo::<Setting>().put(&Setting::new(flag, true))
}

/// Seed every domain. Never fails as a whole; see [`SeedReport::failed`].
pub fn seed_defaults(db: &Database) -> SeedReport {
    let mut report = SeedReport::default();

    seed_named(db, &mut report, "segments", SEGMENTS_FLAG, defaults::segments(), |s: &Segment| &s.name, Some(SEGMENTS_STARTED));
    seed_named(db, &mut report, "metrics", METRICS_FLAG, defaults::metrics(), |m: &Metric| &m.name, None);
    seed_settings(db, &mut report);
    seed_named(db, &mut report, "categories", CATEGORIES_FLAG, defaults::categories(), |c: &Category| &c.name, None);
    seed_named(db, &mut report, "collections", COLLECTIONS_FLAG, defaults::collections(), |c: &Collection| &c.name, None);
    seed_templates(db, &mut report);
    seed_example_task(db, &mut report);

    match ensure_core_metrics(db) {
        Ok(names) => report.reenabled = names,
        Err(e) => warn!(target: "daytrack::seed", error = %e, "could not check core metrics"),
    }

    info!(
        target: "daytrack::seed",
        inserted = report.total_inserted(),
        failed = report.failed.len(),
        "seeding pass finished"
    );
    report
}

fn lowercase_names<E: Entity>(items: &[E], name: fn(&E) -> &String) -> HashSet<String> {
    items.iter().map(|i| name(i).to_lowercase()).collect()
}

/// Insert the named defaults of one domain. With a `started` marker the
/// defaults only go into an empty table; rows found later belong to the user
/// unless the marker shows an earlier pass got interrupted, in which case the
/// missing names are filled in.
fn seed_named<E: Entity>(
    db: &Database,
    report: &mut SeedReport,
    domain: &'static str,
    flag: &str,
    items: Vec<E>,
    name: fn(&E) -> &String,
    started: Option<&str>,
) {
    match flag_is_set(db, flag) {
        Ok(true) => {
            report.skipped.push(domain);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot read initialized flag");
            return;
        }
    }

    let repo = db.repo::<E>();
    let existing = match repo.list() {
        Ok(rows) => rows,
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot list existing rows");
            return;
        }
    };

    let user_rows = match started {
        Some(marker) if !existing.is_empty() => match flag_is_set(db, marker) {
            Ok(resumed) => !resumed,
            Err(e) => {
                warn!(target: "daytrack::seed", domain, error = %e, "cannot read started marker");
                return;
            }
        },
        Some(marker) => {
            if let Err(e) = set_flag(db, marker) {
                warn!(target: "daytrack::seed", domain, error = %e, "cannot set started marker");
                return;
            }
            false
        }
        None => false,
    };

    let mut inserted = 0;
    let mut failures = 0;
    if user_rows {
        debug!(target: "daytrack::seed", domain, rows = existing.len(), "user-defined rows, defaults skipped");
    } else {
        let mut known = lowercase_names(&existing, name);
        for item in items {
            let key = name(&item).to_lowercase();
            if known.contains(&key) {
                debug!(target: "daytrack::seed", domain, item = %name(&item), "already present");
                continue;
            }
            match repo.add(&item) {
                Ok(()) => {
                    inserted += 1;
                    known.insert(key);
                }
                Err(e) => {
                    warn!(target: "daytrack::seed", domain, item = %name(&item), error = %e, "default item failed");
                    report.failed.push((format!("{domain}/{}", name(&item)), e.to_string()));
                    failures += 1;
                }
            }
        }
    }

    report.inserted.insert(domain, inserted);
    finish_domain(db, domain, flag, failures);
}

fn finish_domain(db: &Database, domain: &str, flag: &str, failures: usize) {
    if failures > 0 {
        return;
    }
    if let Err(e) = set_flag(db, flag) {
        warn!(target: "daytrack::seed", domain, error = %e, "cannot set initialized flag");
    }
}

fn seed_settings(db: &Database, report: &mut SeedReport) {
    let domain = "settings";
    match flag_is_set(db, SETTINGS_FLAG) {
        Ok(true) => {
            report.skipped.push(domain);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot read initialized flag");
            return;
        }
    }

    let repo = db.repo::<Setting>();
    let mut inserted = 0;
    let mut failures = 0;
    for (key, value) in defaults::settings() {
        let result = repo.get(key).and_then(|found| match found {
            Some(_) => Ok(false),
            None => repo.add(&Setting::new(key, value)).map(|_| true),
        });
        match result {
            Ok(true) => inserted += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(target: "daytrack::seed", domain, key, error = %e, "default setting failed");
                report.failed.push((format!("{domain}/{key}"), e.to_string()));
                failures += 1;
            }
        }
    }

    report.inserted.insert(domain, inserted);
    finish_domain(db, domain, SETTINGS_FLAG, failures);
}

/// Templates and their subtask templates go in together per template.
fn seed_templates(db: &Database, report: &mut SeedReport) {
    let domain = "templates";
    match flag_is_set(db, TEMPLATES_FLAG) {
        Ok(true) => {
            report.skipped.push(domain);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot read initialized flag");
            return;
        }
    }

    let existing = match db.repo::<TaskTemplate>().list() {
        Ok(rows) => lowercase_names(&rows, |t: &TaskTemplate| &t.name),
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot list existing rows");
            return;
        }
    };

    let mut inserted = 0;
    let mut failures = 0;
    for (template, subtasks) in defaults::task_templates() {
        if existing.contains(&template.name.to_lowercase()) {
            continue;
        }
        let children = defaults::subtask_templates(&template.id, &subtasks);
        let result = db.transaction(&[Table::TaskTemplates, Table::SubtaskTemplates], |tx| {
            tx.repo::<TaskTemplate>().add(&template)?;
            tx.repo::<SubtaskTemplate>().bulk_add(&children)?;
            Ok(())
        });
        match result {
            Ok(()) => inserted += 1,
            Err(e) => {
                warn!(target: "daytrack::seed", domain, item = %template.name, error = %e, "default template failed");
                report.failed.push((format!("{domain}/{}", template.name), e.to_string()));
                failures += 1;
            }
        }
    }

    report.inserted.insert(domain, inserted);
    finish_domain(db, domain, TEMPLATES_FLAG, failures);
}

/// One example task, only when the user has no tasks at all.
fn seed_example_task(db: &Database, report: &mut SeedReport) {
    let domain = "example_task";
    match flag_is_set(db, EXAMPLE_TASK_FLAG) {
        Ok(true) => {
            report.skipped.push(domain);
            return;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "cannot read initialized flag");
            return;
        }
    }

    let result = (|| -> AppResult<usize> {
        if db.repo::<Task>().count()? > 0 {
            return Ok(0);
        }
        let task = defaults::example_task();
        let collection = db
            .repo::<Collection>()
            .list()?
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(EXAMPLE_COLLECTION));

        db.transaction(&[Table::Tasks, Table::TaskCollections], |tx| {
            tx.repo::<Task>().add(&task)?;
            if let Some(col) = &collection {
                tx.repo::<TaskCollection>().add(&TaskCollection {
                    id: new_id("tc"),
                    task_id: task.id.clone(),
                    collection_id: col.id.clone(),
                    order: 0,
                })?;
            }
            Ok(1)
        })
    })();

    let failures = match result {
        Ok(n) => {
            report.inserted.insert(domain, n);
            0
        }
        Err(e) => {
            warn!(target: "daytrack::seed", domain, error = %e, "example task failed");
            report.failed.push((domain.to_string(), e.to_string()));
            1
        }
    };
    finish_domain(db, domain, EXAMPLE_TASK_FLAG, failures);
}

/// Force the five core metrics on, by name. Runs on every boot regardless of
/// the metrics flag.
pub fn ensure_core_metrics(db: &Database) -> AppResult<Vec<String>> {
    let repo = db.repo::<Metric>();
    let mut reenabled = Vec::new();
    for metric in repo.list()? {
        let is_core = CORE_METRICS
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&metric.name));
        if is_core && !metric.enabled {
            repo.update(&metric.id, &json!({ "enabled": true }))?;
            info!(target: "daytrack::seed", metric = %metric.name, "core metric re-enabled");
            reenabled.push(metric.name);
        }
    }
    Ok(reenabled)
}

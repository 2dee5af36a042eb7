//! Live queries: subscriptions that re-run whenever a table they read changes.
//!
//! A subscription records the tables touched during its last run. On
//! [`Database::pump`] every subscription whose tables intersect the changed
//! set re-runs once, however many writes hit those tables in between. The
//! handle reports `None` until the first run resolves.

use crate::db::{Database, Table};
use crate::errors::AppResult;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};
use tracing::warn;

pub(crate) type Runner = Rc<dyn Fn(&Database)>;

struct Subscription {
    runner: Runner,
    touched: BTreeSet<Table>,
    stale: bool,
}

/// Subscription table owned by the database handle.
#[derive(Default)]
pub struct Registry {
    next_id: u64,
    subs: BTreeMap<u64, Subscription>,
}

impl Registry {
    fn insert(&mut self, runner: Runner) -> u64 {
        self.next_id += 1;
        self.subs.insert(
            self.next_id,
            Subscription {
                runner,
                touched: BTreeSet::new(),
                stale: true,
            },
        );
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        self.subs.remove(&id);
    }

    fn mark_stale(&mut self, id: u64) {
        if let Some(s) = self.subs.get_mut(&id) {
            s.stale = true;
        }
    }

    /// Collect the subscriptions that must re-run for `changed`, clearing their
    /// stale flag. Each appears at most once.
    pub(crate) fn take_due(&mut self, changed: &BTreeSet<Table>) -> Vec<(u64, Runner)> {
        self.subs
            .iter_mut()
            .filter(|(_, s)| s.stale || !s.touched.is_disjoint(changed))
            .map(|(id, s)| {
                s.stale = false;
                (*id, Rc::clone(&s.runner))
            })
            .collect()
    }

    pub(crate) fn set_touched(&mut self, id: u64, touched: BTreeSet<Table>) {
        if let Some(s) = self.subs.get_mut(&id) {
            s.touched = touched;
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

struct LiveCell<T, D> {
    deps: D,
    value: Option<T>,
    error: Option<String>,
    generation: u64,
}

/// Handle to a live query. Dropping it deregisters the subscription.
pub struct LiveQuery<T, D = ()> {
    id: u64,
    registry: Weak<RefCell<Registry>>,
    cell: Rc<RefCell<LiveCell<T, D>>>,
}

impl<T, D> LiveQuery<T, D>
where
    T: Clone + 'static,
    D: PartialEq + Clone + 'static,
{
    pub(crate) fn register<F>(registry: &Rc<RefCell<Registry>>, deps: D, query: F) -> Self
    where
        F: Fn(&Database, &D) -> AppResult<T> + 'static,
    {
        let cell = Rc::new(RefCell::new(LiveCell {
            deps,
            value: None,
            error: None,
            generation: 0,
        }));

        let weak = Rc::downgrade(&cell);
        let runner: Runner = Rc::new(move |db: &Database| {
            let Some(cell) = weak.upgrade() else {
                return;
            };
            let deps = cell.borrow().deps.clone();
            let result = query(db, &deps);

            let mut c = cell.borrow_mut();
            match result {
                Ok(v) => {
                    c.value = Some(v);
                    c.error = None;
                    c.generation += 1;
                }
                Err(e) => {
                    warn!(target: "daytrack::live", error = %e, "live query failed, keeping previous value");
                    c.error = Some(e.to_string());
                }
            }
        });

        let id = registry.borrow_mut().insert(runner);
        Self {
            id,
            registry: Rc::downgrade(registry),
            cell,
        }
    }

    /// Latest resolved value; `None` while the first run is pending.
    pub fn current(&self) -> Option<T> {
        self.cell.borrow().value.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.cell.borrow().value.is_none()
    }

    /// Incremented on every successful delivery.
    pub fn generation(&self) -> u64 {
        self.cell.borrow().generation
    }

    pub fn error(&self) -> Option<String> {
        self.cell.borrow().error.clone()
    }

    pub fn deps(&self) -> D {
        self.cell.borrow().deps.clone()
    }

    /// Replace the dependency values; the query re-runs on the next pump
    /// only if they differ.
    pub fn set_deps(&self, deps: D) {
        let changed = {
            let mut c = self.cell.borrow_mut();
            if c.deps == deps {
                false
            } else {
                c.deps = deps;
                true
            }
        };
        if changed {
            self.refresh();
        }
    }

    /// Force a re-run on the next pump.
    pub fn refresh(&self) {
        if let Some(reg) = self.registry.upgrade() {
            reg.borrow_mut().mark_stale(self.id);
        }
    }

    pub fn dispose(self) {}
}

impl<T, D> Drop for LiveQuery<T, D> {
    fn drop(&mut self) {
        if let Some(reg) = self.registry.upgrade() {
            reg.borrow_mut().remove(self.id);
        }
    }
}

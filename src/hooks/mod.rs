//! Optimistic state over live queries.
//!
//! A hook mirrors the value of a [`LiveQuery`]. A mutation replaces the
//! mirror immediately and queues the storage write; [`Optimistic::settle`]
//! performs queued writes in order. When a write fails the mirror goes back
//! to the most recent value the live query delivered (not to the value seen
//! before the mutation), the error is recorded and returned to the caller.

pub mod collection;
pub mod completion;
pub mod settings;
pub mod timer;

pub use collection::CollectionHook;
pub use completion::{FULL_COMPLETION_THRESHOLD, TaskCompletionHook, ToggleOutcome};
pub use settings::SettingsHook;
pub use timer::{TimerPatch, TimerSessionsHook};

use crate::db::Database;
use crate::errors::AppResult;
use crate::live::LiveQuery;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::warn;

type PendingWrite = Box<dyn FnOnce(&Database) -> AppResult<()>>;

pub struct Optimistic<T, D = ()> {
    db: Rc<Database>,
    live: LiveQuery<T, D>,
    mirror: Option<T>,
    last_good: Option<T>,
    seen: u64,
    loading: bool,
    error: Option<String>,
    queue: VecDeque<PendingWrite>,
}

impl<T, D> Optimistic<T, D>
where
    T: Clone + PartialEq + 'static,
    D: PartialEq + Clone + 'static,
{
    pub fn new<F>(db: Rc<Database>, deps: D, query: F) -> Self
    where
        F: Fn(&Database, &D) -> AppResult<T> + 'static,
    {
        let live = db.live(deps, query);
        Self {
            db,
            live,
            mirror: None,
            last_good: None,
            seen: 0,
            loading: false,
            error: None,
            queue: VecDeque::new(),
        }
    }

    /// Adopt a new live delivery, if any.
    fn sync(&mut self) {
        let generation = self.live.generation();
        if generation != self.seen {
            self.seen = generation;
            self.last_good = self.live.current();
            self.mirror = self.last_good.clone();
        }
    }

    /// Current value: the optimistic mirror, or `None` while loading.
    pub fn value(&mut self) -> Option<&T> {
        self.sync();
        self.mirror.as_ref()
    }

    /// Most recent value delivered by the live query.
    pub fn last_known_good(&mut self) -> Option<&T> {
        self.sync();
        self.last_good.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading || self.live.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    pub fn db(&self) -> &Rc<Database> {
        &self.db
    }

    pub fn set_deps(&mut self, deps: D) {
        self.live.set_deps(deps);
    }

    pub fn deps(&self) -> D {
        self.live.deps()
    }

    /// Replace the mirror with `next` and queue `write`. Returns `false`
    /// (and queues nothing) when `next` equals the current mirror.
    pub fn apply<W>(&mut self, next: T, write: W) -> bool
    where
        W: FnOnce(&Database) -> AppResult<()> + 'static,
    {
        self.sync();
        if self.mirror.as_ref() == Some(&next) {
            return false;
        }
        self.mirror = Some(next);
        self.loading = true;
        self.error = None;
        self.queue.push_back(Box::new(write));
        true
    }

    /// Perform queued writes in order, then deliver the resulting changes.
    /// Returns the first write error after reverting the mirror.
    pub fn settle(&mut self) -> AppResult<()> {
        let mut first_err = None;

        while let Some(write) = self.queue.pop_front() {
            if let Err(e) = write(&*self.db) {
                self.sync();
                self.mirror = self.last_good.clone();
                warn!(target: "daytrack::hooks", error = %e, "write rejected, reverted to last known good value");
                self.error = Some(e.to_string());
                first_err.get_or_insert(e);
            }
        }

        self.loading = false;
        self.db.pump();

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

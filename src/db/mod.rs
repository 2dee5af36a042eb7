//! Storage engine: one SQLite file holding JSON document tables.
//!
//! [`Database`] owns the connection and the lifecycle (`open` runs the schema
//! upgrade before the handle is handed out). Reads and writes go through the
//! [`Store`] trait, implemented by the database itself (autocommit) and by
//! [`Tx`] (scoped, all-or-nothing). Committed writes are queued as
//! table-changed notifications for the live query layer.

pub mod backup;
pub mod defaults;
pub mod migrate;
pub mod queries;
pub mod repo;
pub mod schema;
pub mod seed;

pub use repo::{Entity, Repository};
pub use schema::{APP_NAME, SCHEMA_VERSION, Table};

use crate::errors::{AppError, AppResult};
use crate::live::{LiveQuery, Registry};
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
    changes: RefCell<BTreeSet<Table>>,
    reads: RefCell<Option<BTreeSet<Table>>>,
    live: Rc<RefCell<Registry>>,
}

impl Database {
    /// Open (or create) the database file and bring it to [`SCHEMA_VERSION`].
    ///
    /// Fails fast with [`AppError::SchemaTooNew`] when the file was written by a
    /// newer build and with [`AppError::VersionBlocked`] when another process
    /// holds a lock while an upgrade is needed.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> AppResult<Self> {
        conn.busy_timeout(Duration::ZERO)?;

        let db = Self {
            conn,
            path,
            changes: RefCell::new(BTreeSet::new()),
            reads: RefCell::new(None),
            live: Rc::new(RefCell::new(Registry::default())),
        };

        let on_disk = db.user_version()?;
        if on_disk > SCHEMA_VERSION {
            return Err(AppError::SchemaTooNew {
                found: on_disk,
                supported: SCHEMA_VERSION,
            });
        }

        if on_disk < SCHEMA_VERSION {
            if on_disk >= 1
                && let Some(p) = &db.path
            {
                backup::backup_before_upgrade(p, on_disk)?;
            }
            migrate::upgrade(&db, on_disk)?;
            info!(target: "daytrack::db", from = on_disk, to = SCHEMA_VERSION, "schema upgraded");
        }

        // nobody can be subscribed yet
        db.changes.borrow_mut().clear();
        Ok(db)
    }

    /// Close the underlying connection.
    pub fn close(self) -> AppResult<()> {
        self.conn.close().map_err(|(_, e)| AppError::Db(e))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn user_version(&self) -> AppResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Make every subsequent write fail (`PRAGMA query_only`).
    pub fn set_read_only(&self, read_only: bool) -> AppResult<()> {
        self.conn.pragma_update(None, "query_only", read_only)?;
        Ok(())
    }

    /// Begin an IMMEDIATE transaction for a schema upgrade.
    pub(crate) fn begin_upgrade(&self) -> AppResult<Tx<'_>> {
        let inner = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(ref f, _)
                    if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
                {
                    AppError::VersionBlocked(e.to_string())
                }
                other => AppError::Db(other),
            })?;
        Ok(Tx::new(self, inner, Table::ALL.iter().copied().collect()))
    }

    // ---------------------------
    // Live query plumbing
    // ---------------------------

    /// Subscribe to a query. The handle resolves on the next [`Database::pump`].
    pub fn live<T, D, F>(&self, deps: D, query: F) -> LiveQuery<T, D>
    where
        T: Clone + 'static,
        D: PartialEq + Clone + 'static,
        F: Fn(&Database, &D) -> AppResult<T> + 'static,
    {
        LiveQuery::register(&self.live, deps, query)
    }

    /// Deliver pending table changes: every subscription that read a changed
    /// table (or is new, or had its deps changed) re-runs once. Returns the
    /// number of queries executed.
    pub fn pump(&self) -> usize {
        let changed = std::mem::take(&mut *self.changes.borrow_mut());
        let due = self.live.borrow_mut().take_due(&changed);

        for (id, runner) in &due {
            *self.reads.borrow_mut() = Some(BTreeSet::new());
            runner(self);
            let touched = self.reads.borrow_mut().take().unwrap_or_default();
            self.live.borrow_mut().set_touched(*id, touched);
        }

        if !due.is_empty() {
            debug!(target: "daytrack::live", tables = ?changed, reran = due.len(), "pumped");
        }
        due.len()
    }

    /// Tables changed since the last pump.
    pub fn pending_changes(&self) -> BTreeSet<Table> {
        self.changes.borrow().clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.live.borrow().len()
    }

    fn publish(&self, tables: impl IntoIterator<Item = Table>) {
        self.changes.borrow_mut().extend(tables);
    }
}

/// Read/write access to document tables. Implemented by [`Database`]
/// (each write autocommits) and by [`Tx`] (writes commit together).
pub trait Store {
    fn conn(&self) -> &Connection;

    /// Record that `table` was read (feeds live query dependency tracking).
    fn note_read(&self, table: Table);

    /// Reject writes to tables outside the current transaction scope.
    fn check_write(&self, table: Table) -> AppResult<()>;

    /// Record a successful write to `table`.
    fn mark_changed(&self, table: Table);

    /// Run `f` inside a transaction scoped to `tables`.
    fn transaction<R, F>(&self, tables: &[Table], f: F) -> AppResult<R>
    where
        F: FnOnce(&Tx<'_>) -> AppResult<R>;

    fn get(&self, table: Table, id: &str) -> AppResult<Option<Value>> {
        self.note_read(table);
        queries::get(self.conn(), table, id)
    }

    fn all(&self, table: Table) -> AppResult<Vec<Value>> {
        self.note_read(table);
        queries::all(self.conn(), table)
    }

    fn count(&self, table: Table) -> AppResult<i64> {
        self.note_read(table);
        queries::count(self.conn(), table)
    }

    fn where_eq(&self, table: Table, field: &str, value: &Value) -> AppResult<Vec<Value>> {
        self.note_read(table);
        queries::where_eq(self.conn(), table, field, value)
    }

    fn where_between(
        &self,
        table: Table,
        field: &str,
        lower: &Value,
        upper: &Value,
    ) -> AppResult<Vec<Value>> {
        self.note_read(table);
        queries::where_between(self.conn(), table, field, lower, upper)
    }

    /// Upsert a full record.
    fn put(&self, table: Table, doc: &Value) -> AppResult<String> {
        self.check_write(table)?;
        let id = queries::put(self.conn(), table, doc)?;
        self.mark_changed(table);
        Ok(id)
    }

    fn add(&self, table: Table, doc: &Value) -> AppResult<String> {
        self.check_write(table)?;
        let id = queries::add(self.conn(), table, doc)?;
        self.mark_changed(table);
        Ok(id)
    }

    /// Insert many records atomically.
    fn bulk_add(&self, table: Table, docs: &[Value]) -> AppResult<usize> {
        self.transaction(&[table], |tx| {
            for doc in docs {
                tx.add(table, doc)?;
            }
            Ok(docs.len())
        })
    }

    /// Merge a partial record into an existing one.
    fn update(&self, table: Table, id: &str, patch: &Value) -> AppResult<bool> {
        self.check_write(table)?;
        let found = queries::update(self.conn(), table, id, patch)?;
        if found {
            self.mark_changed(table);
        }
        Ok(found)
    }

    fn delete(&self, table: Table, id: &str) -> AppResult<bool> {
        self.check_write(table)?;
        let found = queries::delete(self.conn(), table, id)?;
        if found {
            self.mark_changed(table);
        }
        Ok(found)
    }

    fn clear(&self, table: Table) -> AppResult<usize> {
        self.check_write(table)?;
        let n = queries::clear(self.conn(), table)?;
        self.mark_changed(table);
        Ok(n)
    }

    /// Typed access to the table of `E`.
    fn repo<E: Entity>(&self) -> Repository<'_, E, Self>
    where
        Self: Sized,
    {
        Repository::new(self)
    }
}

impl Store for Database {
    fn conn(&self) -> &Connection {
        &self.conn
    }

    fn note_read(&self, table: Table) {
        if let Some(reads) = self.reads.borrow_mut().as_mut() {
            reads.insert(table);
        }
    }

    fn check_write(&self, _table: Table) -> AppResult<()> {
        Ok(())
    }

    fn mark_changed(&self, table: Table) {
        self.publish([table]);
    }

    fn transaction<R, F>(&self, tables: &[Table], f: F) -> AppResult<R>
    where
        F: FnOnce(&Tx<'_>) -> AppResult<R>,
    {
        let inner = self.conn.unchecked_transaction()?;
        let tx = Tx::new(self, inner, tables.iter().copied().collect());
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// A transaction scoped to a fixed set of tables. Dropping it without
/// [`Tx::commit`] rolls back and discards its change notifications.
pub struct Tx<'db> {
    db: &'db Database,
    inner: Transaction<'db>,
    scope: BTreeSet<Table>,
    changed: RefCell<BTreeSet<Table>>,
}

impl<'db> Tx<'db> {
    fn new(db: &'db Database, inner: Transaction<'db>, scope: BTreeSet<Table>) -> Self {
        Self {
            db,
            inner,
            scope,
            changed: RefCell::new(BTreeSet::new()),
        }
    }

    pub fn commit(self) -> AppResult<()> {
        let changed = self.changed.into_inner();
        self.inner.commit()?;
        self.db.publish(changed);
        Ok(())
    }

    pub fn scope(&self) -> &BTreeSet<Table> {
        &self.scope
    }
}

impl Store for Tx<'_> {
    fn conn(&self) -> &Connection {
        &self.inner
    }

    fn note_read(&self, table: Table) {
        self.db.note_read(table);
    }

    fn check_write(&self, table: Table) -> AppResult<()> {
        if self.scope.contains(&table) {
            Ok(())
        } else {
            Err(AppError::Other(format!(
                "table '{table}' is outside the transaction scope"
            )))
        }
    }

    fn mark_changed(&self, table: Table) {
        self.changed.borrow_mut().insert(table);
    }

    fn transaction<R, F>(&self, tables: &[Table], f: F) -> AppResult<R>
    where
        F: FnOnce(&Tx<'_>) -> AppResult<R>,
    {
        for t in tables {
            self.check_write(*t)?;
        }
        f(self)
    }
}

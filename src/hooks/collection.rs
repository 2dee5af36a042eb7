//! List-level hook over one entity table.

use crate::db::queries::merge_patch;
use crate::db::{Database, Entity, Store};
use crate::errors::{AppError, AppResult};
use crate::hooks::Optimistic;
use serde_json::Value;
use std::rc::Rc;

pub struct CollectionHook<E: Entity> {
    inner: Optimistic<Vec<E>>,
}

impl<E: Entity> CollectionHook<E> {
    pub fn new(db: Rc<Database>) -> Self {
        Self {
            inner: Optimistic::new(db, (), |db, _| db.repo::<E>().list()),
        }
    }

    pub fn value(&mut self) -> Option<&Vec<E>> {
        self.inner.value()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.inner.error()
    }

    fn current(&mut self) -> Vec<E> {
        self.inner.value().cloned().unwrap_or_default()
    }

    /// Replace the whole list (clear + bulk add in one transaction). Skipped
    /// when `items` is structurally equal to the current list.
    pub fn replace_all(&mut self, items: Vec<E>) -> bool {
        let write = items.clone();
        self.inner
            .apply(items, move |db| db.repo::<E>().bulk_replace(&write))
    }

    pub fn add(&mut self, item: E) -> bool {
        let mut next = self.current();
        next.push(item.clone());
        self.inner.apply(next, move |db| db.repo::<E>().add(&item))
    }

    /// Merge a partial record into the item with `id`.
    pub fn update(&mut self, id: &str, patch: Value) -> AppResult<bool> {
        let mut next = self.current();
        let Some(pos) = next.iter().position(|e| e.id() == id) else {
            return Err(AppError::NotFound {
                table: E::TABLE.name(),
                id: id.to_string(),
            });
        };

        let mut doc = serde_json::to_value(&next[pos])?;
        merge_patch(&mut doc, &patch);
        next[pos] = serde_json::from_value(doc)?;

        let id = id.to_string();
        Ok(self.inner.apply(next, move |db| {
            if db.repo::<E>().update(&id, &patch)? {
                Ok(())
            } else {
                Err(AppError::NotFound {
                    table: E::TABLE.name(),
                    id,
                })
            }
        }))
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let mut next = self.current();
        next.retain(|e| e.id() != id);
        let id = id.to_string();
        self.inner.apply(next, move |db| {
            db.repo::<E>().delete(&id)?;
            Ok(())
        })
    }

    pub fn settle(&mut self) -> AppResult<()> {
        self.inner.settle()
    }
}

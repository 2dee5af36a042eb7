//! Strongly typed repositories over document tables.

use crate::db::{Store, Table};
use crate::errors::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// A record stored in exactly one table.
pub trait Entity: Serialize + DeserializeOwned + Clone + PartialEq + 'static {
    const TABLE: Table;

    fn id(&self) -> &str;
}

/// The same capability set for every entity: list, get, put, bulk replace.
pub struct Repository<'s, E, S: Store> {
    store: &'s S,
    _entity: PhantomData<E>,
}

pub(crate) fn decode<E: Entity>(doc: Value) -> AppResult<E> {
    Ok(serde_json::from_value(doc)?)
}

pub(crate) fn encode<E: Entity>(item: &E) -> AppResult<Value> {
    Ok(serde_json::to_value(item)?)
}

impl<'s, E: Entity, S: Store> Repository<'s, E, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn list(&self) -> AppResult<Vec<E>> {
        self.store.all(E::TABLE)?.into_iter().map(decode).collect()
    }

    pub fn get(&self, id: &str) -> AppResult<Option<E>> {
        self.store.get(E::TABLE, id)?.map(decode).transpose()
    }

    pub fn count(&self) -> AppResult<i64> {
        self.store.count(E::TABLE)
    }

    /// Equality lookup on a declared index.
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> AppResult<Vec<E>> {
        self.store
            .where_eq(E::TABLE, field, &value.into())?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub fn put(&self, item: &E) -> AppResult<()> {
        self.store.put(E::TABLE, &encode(item)?)?;
        Ok(())
    }

    pub fn add(&self, item: &E) -> AppResult<()> {
        self.store.add(E::TABLE, &encode(item)?)?;
        Ok(())
    }

    pub fn bulk_add(&self, items: &[E]) -> AppResult<usize> {
        let docs = items.iter().map(encode).collect::<AppResult<Vec<_>>>()?;
        self.store.bulk_add(E::TABLE, &docs)
    }

    /// Replace the whole table in one transaction (clear + bulk add).
    pub fn bulk_replace(&self, items: &[E]) -> AppResult<()> {
        let docs = items.iter().map(encode).collect::<AppResult<Vec<_>>>()?;
        self.store.transaction(&[E::TABLE], |tx| {
            tx.clear(E::TABLE)?;
            for doc in &docs {
                tx.add(E::TABLE, doc)?;
            }
            Ok(())
        })
    }

    pub fn update(&self, id: &str, patch: &Value) -> AppResult<bool> {
        self.store.update(E::TABLE, id, patch)
    }

    pub fn delete(&self, id: &str) -> AppResult<bool> {
        self.store.delete(E::TABLE, id)
    }
}

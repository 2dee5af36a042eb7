//! Raw document operations over a SQLite connection.
//!
//! Every table is `(id TEXT PRIMARY KEY, doc TEXT NOT NULL)`; `doc` is the
//! JSON record. Callers go through [`crate::db::Store`], which adds change
//! tracking and transaction scoping on top of these functions.

use crate::db::schema::Table;
use crate::errors::{AppError, AppResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};

/// Extract the primary key of `doc` for `table`.
pub fn doc_id(table: Table, doc: &Value) -> AppResult<String> {
    match doc.get(table.primary_key()) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(AppError::Invalid(format!(
            "record for '{}' has no '{}' field",
            table,
            table.primary_key()
        ))),
    }
}

/// Convert a JSON scalar to the SQL value `json_extract` would yield for it.
pub fn sql_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn parse_rows(conn: &Connection, sql: &str, args: &[SqlValue]) -> AppResult<Vec<Value>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
        row.get::<_, String>(0)
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(serde_json::from_str(&r?)?);
    }
    Ok(out)
}

pub fn get(conn: &Connection, table: Table, id: &str) -> AppResult<Option<Value>> {
    let sql = format!("SELECT doc FROM {} WHERE id = ?1", table.name());
    let raw: Option<String> = conn
        .prepare_cached(&sql)?
        .query_row([id], |row| row.get(0))
        .optional()?;

    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn all(conn: &Connection, table: Table) -> AppResult<Vec<Value>> {
    let sql = format!("SELECT doc FROM {} ORDER BY rowid ASC", table.name());
    parse_rows(conn, &sql, &[])
}

pub fn count(conn: &Connection, table: Table) -> AppResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table.name());
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

fn field_expr(table: Table, field: &str) -> AppResult<String> {
    if !table.is_indexed(field) {
        return Err(AppError::UnknownIndex {
            table: table.name(),
            field: field.to_string(),
        });
    }
    if field == table.primary_key() {
        Ok("id".to_string())
    } else {
        Ok(format!("json_extract(doc, '$.{field}')"))
    }
}

/// Equality query against a declared index.
pub fn where_eq(conn: &Connection, table: Table, field: &str, value: &Value) -> AppResult<Vec<Value>> {
    let expr = field_expr(table, field)?;
    let sql = format!(
        "SELECT doc FROM {} WHERE {expr} = ?1 ORDER BY rowid ASC",
        table.name()
    );
    parse_rows(conn, &sql, &[sql_value(value)])
}

/// Inclusive range query against a declared index.
pub fn where_between(
    conn: &Connection,
    table: Table,
    field: &str,
    lower: &Value,
    upper: &Value,
) -> AppResult<Vec<Value>> {
    let expr = field_expr(table, field)?;
    let sql = format!(
        "SELECT doc FROM {} WHERE {expr} BETWEEN ?1 AND ?2 ORDER BY {expr} ASC, rowid ASC",
        table.name()
    );
    parse_rows(conn, &sql, &[sql_value(lower), sql_value(upper)])
}

/// Insert or replace a full record.
pub fn put(conn: &Connection, table: Table, doc: &Value) -> AppResult<String> {
    let id = doc_id(table, doc)?;
    let sql = format!(
        "INSERT INTO {} (id, doc) VALUES (?1, ?2)
         ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
        table.name()
    );
    conn.prepare_cached(&sql)?
        .execute(params![id, serde_json::to_string(doc)?])?;
    Ok(id)
}

/// Insert a new record; fails with [`AppError::Duplicate`] when the id exists.
pub fn add(conn: &Connection, table: Table, doc: &Value) -> AppResult<String> {
    let id = doc_id(table, doc)?;
    let sql = format!("INSERT OR IGNORE INTO {} (id, doc) VALUES (?1, ?2)", table.name());
    let n = conn
        .prepare_cached(&sql)?
        .execute(params![id, serde_json::to_string(doc)?])?;
    if n == 0 {
        return Err(AppError::Duplicate {
            table: table.name(),
            id,
        });
    }
    Ok(id)
}

/// Shallow merge of `patch` into an object: `null` removes a field.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Some(patch) = patch.as_object() else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(obj) = target.as_object_mut() {
        for (k, v) in patch {
            if v.is_null() {
                obj.remove(k);
            } else {
                obj.insert(k.clone(), v.clone());
            }
        }
    }
}

/// Merge `patch` into an existing record. Returns `false` when the id is unknown.
pub fn update(conn: &Connection, table: Table, id: &str, patch: &Value) -> AppResult<bool> {
    let Some(mut doc) = get(conn, table, id)? else {
        return Ok(false);
    };
    merge_patch(&mut doc, patch);
    // the primary key cannot be changed by a patch
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(table.primary_key().to_string(), Value::String(id.to_string()));
    }
    let sql = format!("UPDATE {} SET doc = ?1 WHERE id = ?2", table.name());
    conn.prepare_cached(&sql)?
        .execute(params![serde_json::to_string(&doc)?, id])?;
    Ok(true)
}

pub fn delete(conn: &Connection, table: Table, id: &str) -> AppResult<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
    Ok(conn.prepare_cached(&sql)?.execute([id])? > 0)
}

pub fn clear(conn: &Connection, table: Table) -> AppResult<usize> {
    let sql = format!("DELETE FROM {}", table.name());
    Ok(conn.execute(&sql, [])?)
}

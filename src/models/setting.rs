use crate::db::{Entity, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic key/value row; exactly one per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: Value,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Entity for Setting {
    const TABLE: Table = Table::Settings;

    fn id(&self) -> &str {
        &self.key
    }
}

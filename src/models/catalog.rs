//! Organisational metadata: categories, collections, templates, metrics.

use crate::db::{Entity, Table};
use crate::models::task::TaskType;
use serde::{Deserialize, Serialize};

macro_rules! entity {
    ($ty:ty, $table:expr) => {
        impl Entity for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}
entity!(Category, Table::Categories);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
}
entity!(Collection, Table::Collections);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub task_type: TaskType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_segment: Option<String>,
}
entity!(TaskTemplate, Table::TaskTemplates);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskTemplate {
    pub id: String,
    pub template_id: String,
    pub name: String,
    #[serde(default)]
    pub order: u32,
}
entity!(SubtaskTemplate, Table::SubtaskTemplates);

/// Junction row placing a task in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCollection {
    pub id: String,
    pub task_id: String,
    pub collection_id: String,
    #[serde(default)]
    pub order: u32,
}
entity!(TaskCollection, Table::TaskCollections);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(default = "default_min")]
    pub min: u8,
    #[serde(default = "default_max")]
    pub max: u8,
    #[serde(default)]
    pub order: u32,
}
entity!(Metric, Table::Metrics);

fn default_min() -> u8 {
    1
}

fn default_max() -> u8 {
    10
}

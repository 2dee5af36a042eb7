//! Schema registry: the current schema version plus every table and its
//! declared indexes. Pure declaration, the engine turns it into DDL.

/// Name of the physical database (file stem and config directory).
pub const APP_NAME: &str = "daytrack";

/// Current structural schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 3;

/// A secondary index over one or more top-level document fields.
#[derive(Debug, Clone, Copy)]
pub struct Index {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Segments,
    CheckIns,
    Tasks,
    TaskEntries,
    Subtasks,
    SubtaskEntries,
    TimerSessions,
    Categories,
    Collections,
    TaskTemplates,
    SubtaskTemplates,
    TaskCollections,
    Metrics,
    Settings,
}

impl Table {
    pub const ALL: [Table; 14] = [
        Table::Segments,
        Table::CheckIns,
        Table::Tasks,
        Table::TaskEntries,
        Table::Subtasks,
        Table::SubtaskEntries,
        Table::TimerSessions,
        Table::Categories,
        Table::Collections,
        Table::TaskTemplates,
        Table::SubtaskTemplates,
        Table::TaskCollections,
        Table::Metrics,
        Table::Settings,
    ];

    /// Physical table name.
    pub fn name(self) -> &'static str {
        match self {
            Table::Segments => "segments",
            Table::CheckIns => "check_ins",
            Table::Tasks => "tasks",
            Table::TaskEntries => "task_entries",
            Table::Subtasks => "subtasks",
            Table::SubtaskEntries => "subtask_entries",
            Table::TimerSessions => "timer_sessions",
            Table::Categories => "categories",
            Table::Collections => "collections",
            Table::TaskTemplates => "task_templates",
            Table::SubtaskTemplates => "subtask_templates",
            Table::TaskCollections => "task_collections",
            Table::Metrics => "metrics",
            Table::Settings => "settings",
        }
    }

    /// Document field holding the primary key.
    pub fn primary_key(self) -> &'static str {
        match self {
            Table::Settings => "key",
            _ => "id",
        }
    }

    pub fn indexes(self) -> &'static [Index] {
        match self {
            Table::Segments => &[
                Index { name: "name", fields: &["name"] },
                Index { name: "start", fields: &["startTime"] },
            ],
            Table::CheckIns => &[
                Index { name: "date", fields: &["date"] },
                Index { name: "segment", fields: &["segmentId"] },
                Index { name: "date_segment", fields: &["date", "segmentId"] },
            ],
            Table::Tasks => &[
                Index { name: "name", fields: &["name"] },
                Index { name: "status", fields: &["status"] },
                Index { name: "segment", fields: &["preferredSegment"] },
                Index { name: "archived", fields: &["isArchived"] },
                Index { name: "category", fields: &["category"] },
            ],
            Table::TaskEntries => &[
                Index { name: "task", fields: &["taskId"] },
                Index { name: "date", fields: &["date"] },
                Index { name: "task_date", fields: &["taskId", "date"] },
            ],
            Table::Subtasks => &[Index { name: "task", fields: &["taskId"] }],
            Table::SubtaskEntries => &[
                Index { name: "subtask", fields: &["subtaskId"] },
                Index { name: "task", fields: &["taskId"] },
                Index { name: "date", fields: &["date"] },
            ],
            Table::TimerSessions => &[
                Index { name: "task", fields: &["taskId"] },
                Index { name: "start", fields: &["startTime"] },
                Index { name: "previous", fields: &["previousSessionId"] },
            ],
            Table::Categories => &[Index { name: "name", fields: &["name"] }],
            Table::Collections => &[Index { name: "name", fields: &["name"] }],
            Table::TaskTemplates => &[Index { name: "name", fields: &["name"] }],
            Table::SubtaskTemplates => &[Index { name: "template", fields: &["templateId"] }],
            Table::TaskCollections => &[
                Index { name: "task", fields: &["taskId"] },
                Index { name: "collection", fields: &["collectionId"] },
                Index { name: "collection_task", fields: &["collectionId", "taskId"] },
            ],
            Table::Metrics => &[
                Index { name: "name", fields: &["name"] },
                Index { name: "enabled", fields: &["enabled"] },
            ],
            Table::Settings => &[],
        }
    }

    /// True when `field` is covered by a declared index (or is the primary key).
    pub fn is_indexed(self, field: &str) -> bool {
        field == self.primary_key()
            || self
                .indexes()
                .iter()
                .any(|i| i.fields.contains(&field))
    }

    /// DDL creating the table and its indexes. Idempotent.
    pub fn ddl(self) -> String {
        let name = self.name();
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {name} (\n    id  TEXT PRIMARY KEY,\n    doc TEXT NOT NULL\n);\n"
        );
        for index in self.indexes() {
            let cols = index
                .fields
                .iter()
                .map(|f| format!("json_extract(doc, '$.{f}')"))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{name}_{} ON {name}({cols});\n",
                index.name
            ));
        }
        sql
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

use crate::error::AppError;
use crate::model::{Activity, Task};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fixed column set as `(id, title)`, in rendering order.
pub const DEFAULT_COLUMNS: [(&str, &str); 3] =
    [("todo", "To Do"), ("doing", "Doing"), ("done", "Done")];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub columns: BTreeMap<String, Column>,
    pub column_order: Vec<String>,
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
    #[serde(default)]
    pub activity_log: Vec<Activity>,
}

impl Default for Board {
    fn default() -> Self {
        let columns = DEFAULT_COLUMNS
            .iter()
            .map(|(id, title)| {
                (
                    id.to_string(),
                    Column {
                        id: id.to_string(),
                        title: title.to_string(),
                        task_ids: Vec::new(),
                    },
                )
            })
            .collect();

        Self {
            columns,
            column_order: DEFAULT_COLUMNS.iter().map(|(id, _)| id.to_string()).collect(),
            tasks: BTreeMap::new(),
            activity_log: Vec::new(),
        }
    }
}

impl Board {
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.get(column_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    /// Columns in rendering order. Ids missing from `columns` are skipped.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order
            .iter()
            .filter_map(|column_id| self.columns.get(column_id))
    }

    /// Column id and position currently holding `task_id`.
    pub fn locate(&self, task_id: &str) -> Option<(&str, usize)> {
        self.ordered_columns().find_map(|column| {
            column
                .task_ids
                .iter()
                .position(|id| id == task_id)
                .map(|index| (column.id.as_str(), index))
        })
    }

    /// Total number of task references across all columns.
    pub fn placed_task_count(&self) -> usize {
        self.columns.values().map(|column| column.task_ids.len()).sum()
    }

    /// Checks the structural shape that persisted data must have before it
    /// is adopted: map keys agree with column ids and `column_order` is a
    /// permutation of those keys.
    pub fn validate_layout(&self) -> Result<(), AppError> {
        for (key, column) in &self.columns {
            if key != &column.id {
                return Err(AppError::invalid_data(format!(
                    "column key '{key}' does not match id '{}'",
                    column.id
                )));
            }
        }

        let ordered: BTreeSet<&str> = self.column_order.iter().map(String::as_str).collect();
        let keys: BTreeSet<&str> = self.columns.keys().map(String::as_str).collect();
        if ordered.len() != self.column_order.len() || ordered != keys {
            return Err(AppError::invalid_data(
                "columnOrder is not a permutation of columns",
            ));
        }

        Ok(())
    }
}

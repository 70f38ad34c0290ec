use crate::error::AppError;
use crate::model::{Board, Column, Priority, Task};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(self, priority: Priority) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == priority,
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        raw.parse().map(Self::Only)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search_text: String,
    pub priority: PriorityFilter,
    pub sort_by_due_date: bool,
}

impl ViewQuery {
    fn accepts(&self, task: &Task, needle: &str) -> bool {
        (needle.is_empty() || task.title.to_lowercase().contains(needle))
            && self.priority.matches(task.priority)
    }
}

/// Tasks of one column after search, priority filter and optional due-date
/// sort. Ids without a task record are skipped; an unknown column yields
/// nothing.
pub fn derive_view<'a>(board: &'a Board, column_id: &str, query: &ViewQuery) -> Vec<&'a Task> {
    let Some(column) = board.column(column_id) else {
        return Vec::new();
    };

    let needle = query.search_text.to_lowercase();
    let mut tasks: Vec<&Task> = column
        .task_ids
        .iter()
        .filter_map(|id| board.task(id))
        .filter(|task| query.accepts(task, &needle))
        .collect();

    if query.sort_by_due_date {
        // stable: undated and equal dates keep column order
        tasks.sort_by_key(|task| {
            let due = task.due();
            (due.is_none(), due)
        });
    }

    tasks
}

/// Every column in rendering order with its derived tasks.
pub fn board_view<'a>(board: &'a Board, query: &ViewQuery) -> Vec<(&'a Column, Vec<&'a Task>)> {
    board
        .ordered_columns()
        .map(|column| (column, derive_view(board, &column.id, query)))
        .collect()
}

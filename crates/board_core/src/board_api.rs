use crate::error::AppError;
use crate::id::{IdSource, RandomIds};
use crate::model::{Activity, ActivityKind, Board, Column, TaskDraft, TaskUpdate};
use crate::storage::BoardPersistence;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNKNOWN_TASK_TITLE: &str = "Unknown Task";

/// A position inside a column, as reported by a drag source or drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub column_id: String,
    pub index: usize,
}

impl Location {
    pub fn new<C: Into<String>>(column_id: C, index: usize) -> Self {
        Self {
            column_id: column_id.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTask {
        draft: TaskDraft,
        column_id: String,
    },
    DeleteTask {
        task_id: String,
        column_id: String,
    },
    UpdateTask {
        task_id: String,
        updates: TaskUpdate,
    },
    /// `destination: None` is a cancelled drag.
    MoveTask {
        source: Location,
        destination: Option<Location>,
        task_id: String,
    },
    ResetBoard,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTask { .. } => "add_task",
            Self::DeleteTask { .. } => "delete_task",
            Self::UpdateTask { .. } => "update_task",
            Self::MoveTask { .. } => "move_task",
            Self::ResetBoard => "reset_board",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// New snapshot; `task_id` is the task the command acted on.
    Changed { board: Board, task_id: Option<String> },
    Unchanged,
}

/// Computes the snapshot that follows `command`. The input board is never
/// modified; rejected commands return an error and no snapshot.
pub fn apply(
    board: &Board,
    command: Command,
    ids: &mut dyn IdSource,
    now: &str,
) -> Result<Transition, AppError> {
    match command {
        Command::AddTask { draft, column_id } => add(board, draft, &column_id, ids, now),
        Command::DeleteTask { task_id, column_id } => {
            delete(board, &task_id, &column_id, ids, now)
        }
        Command::UpdateTask { task_id, updates } => update(board, &task_id, updates, ids, now),
        Command::MoveTask {
            source,
            destination,
            task_id,
        } => match destination {
            None => Ok(Transition::Unchanged),
            Some(destination) => move_to(board, &source, &destination, &task_id, ids, now),
        },
        Command::ResetBoard => Ok(Transition::Changed {
            board: Board::default(),
            task_id: None,
        }),
    }
}

fn add(
    board: &Board,
    draft: TaskDraft,
    column_id: &str,
    ids: &mut dyn IdSource,
    now: &str,
) -> Result<Transition, AppError> {
    require_column(board, column_id)?;

    let mut task_id = ids.next_id();
    while board.tasks.contains_key(&task_id) {
        task_id = ids.next_id();
    }
    let task = draft.into_task(task_id.clone(), now.to_string())?;

    let mut next = board.clone();
    let title = task.title.clone();
    next.tasks.insert(task_id.clone(), task);
    if let Some(column) = next.columns.get_mut(column_id) {
        column.task_ids.push(task_id.clone());
    }
    record(&mut next, ids, ActivityKind::Created, &task_id, title, now);

    Ok(Transition::Changed {
        board: next,
        task_id: Some(task_id),
    })
}

fn delete(
    board: &Board,
    task_id: &str,
    column_id: &str,
    ids: &mut dyn IdSource,
    now: &str,
) -> Result<Transition, AppError> {
    let column = require_column(board, column_id)?;
    let listed = column.task_ids.iter().any(|id| id == task_id);
    let task = board.tasks.get(task_id);

    if !listed {
        if let Some((holder, _)) = board.locate(task_id) {
            return Err(AppError::invalid_input(format!(
                "task '{task_id}' is in column '{holder}', not '{column_id}'"
            )));
        }
        if task.is_none() {
            return Err(AppError::invalid_input("task not found"));
        }
    }

    let title = task
        .map(|task| task.title.clone())
        .unwrap_or_else(|| UNKNOWN_TASK_TITLE.to_string());

    let mut next = board.clone();
    next.tasks.remove(task_id);
    if let Some(column) = next.columns.get_mut(column_id) {
        column.task_ids.retain(|id| id != task_id);
    }
    record(&mut next, ids, ActivityKind::Deleted, task_id, title, now);

    Ok(Transition::Changed {
        board: next,
        task_id: Some(task_id.to_string()),
    })
}

fn update(
    board: &Board,
    task_id: &str,
    updates: TaskUpdate,
    ids: &mut dyn IdSource,
    now: &str,
) -> Result<Transition, AppError> {
    let task = board
        .tasks
        .get(task_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    let changes = updates.changed_fields();
    let merged = updates.merge_onto(task)?;
    let title = merged.title.clone();

    let mut next = board.clone();
    next.tasks.insert(task_id.to_string(), merged);
    record(
        &mut next,
        ids,
        ActivityKind::Updated { changes },
        task_id,
        title,
        now,
    );

    Ok(Transition::Changed {
        board: next,
        task_id: Some(task_id.to_string()),
    })
}

fn move_to(
    board: &Board,
    source: &Location,
    destination: &Location,
    task_id: &str,
    ids: &mut dyn IdSource,
    now: &str,
) -> Result<Transition, AppError> {
    if source == destination {
        return Ok(Transition::Unchanged);
    }

    let start = require_column(board, &source.column_id)?;
    let finish = require_column(board, &destination.column_id)?;
    let task = board
        .tasks
        .get(task_id)
        .ok_or_else(|| AppError::invalid_input("task not found"))?;

    if start.task_ids.get(source.index).map(String::as_str) != Some(task_id) {
        return Err(AppError::invalid_input(format!(
            "task '{task_id}' is not at position {} in column '{}'",
            source.index, source.column_id
        )));
    }

    let mut start_ids = start.task_ids.clone();
    start_ids.remove(source.index);

    if source.column_id == destination.column_id {
        let index = destination.index.min(start_ids.len());
        start_ids.insert(index, task_id.to_string());
        if start_ids == start.task_ids {
            return Ok(Transition::Unchanged);
        }

        let mut next = board.clone();
        if let Some(column) = next.columns.get_mut(&source.column_id) {
            column.task_ids = start_ids;
        }
        return Ok(Transition::Changed {
            board: next,
            task_id: Some(task_id.to_string()),
        });
    }

    let mut finish_ids = finish.task_ids.clone();
    let index = destination.index.min(finish_ids.len());
    finish_ids.insert(index, task_id.to_string());

    let kind = ActivityKind::Moved {
        from: start.title.clone(),
        to: finish.title.clone(),
    };
    let title = task.title.clone();

    let mut next = board.clone();
    if let Some(column) = next.columns.get_mut(&source.column_id) {
        column.task_ids = start_ids;
    }
    if let Some(column) = next.columns.get_mut(&destination.column_id) {
        column.task_ids = finish_ids;
    }
    record(&mut next, ids, kind, task_id, title, now);

    Ok(Transition::Changed {
        board: next,
        task_id: Some(task_id.to_string()),
    })
}

fn require_column<'a>(
    board: &'a Board,
    column_id: &str,
) -> Result<&'a Column, AppError> {
    board
        .column(column_id)
        .ok_or_else(|| AppError::invalid_input(format!("column '{column_id}' not found")))
}

fn record(
    board: &mut Board,
    ids: &mut dyn IdSource,
    kind: ActivityKind,
    task_id: &str,
    task_title: String,
    now: &str,
) {
    board.activity_log.insert(
        0,
        Activity {
            id: ids.next_id(),
            kind,
            task_id: task_id.to_string(),
            task_title,
            timestamp: now.to_string(),
        },
    );
}

fn now_rfc3339() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub changed: bool,
    pub task_id: Option<String>,
}

/// Owns the current board snapshot. Every change goes through `dispatch`,
/// which persists the new snapshot before adopting it.
pub struct BoardStore<P: BoardPersistence> {
    board: Board,
    persistence: P,
    ids: Box<dyn IdSource>,
}

impl<P: BoardPersistence> BoardStore<P> {
    /// Restores the persisted board, or starts from the default one.
    pub fn open(persistence: P) -> Self {
        Self::with_ids(persistence, RandomIds)
    }

    pub fn with_ids<I: IdSource + 'static>(persistence: P, ids: I) -> Self {
        let board = persistence.load().unwrap_or_default();
        Self {
            board,
            persistence,
            ids: Box::new(ids),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Dispatched, AppError> {
        let name = command.name();
        let now = now_rfc3339()?;

        let transition = match apply(&self.board, command, self.ids.as_mut(), &now) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::warn!(command = name, error = %err, "command rejected");
                return Err(err);
            }
        };

        match transition {
            Transition::Unchanged => {
                tracing::debug!(command = name, "no-op");
                Ok(Dispatched {
                    changed: false,
                    task_id: None,
                })
            }
            Transition::Changed { board, task_id } => {
                self.persistence.save(&board)?;
                self.board = board;
                tracing::debug!(
                    command = name,
                    task_id = task_id.as_deref().unwrap_or("-"),
                    log_len = self.board.activity_log.len(),
                    "board updated"
                );
                Ok(Dispatched {
                    changed: true,
                    task_id,
                })
            }
        }
    }

    /// Adds a task at the end of `column_id` and returns its id.
    pub fn add_task(&mut self, draft: TaskDraft, column_id: &str) -> Result<String, AppError> {
        let dispatched = self.dispatch(Command::AddTask {
            draft,
            column_id: column_id.to_string(),
        })?;
        dispatched
            .task_id
            .ok_or_else(|| AppError::invalid_data("add produced no task id"))
    }

    pub fn delete_task(&mut self, task_id: &str, column_id: &str) -> Result<(), AppError> {
        self.dispatch(Command::DeleteTask {
            task_id: task_id.to_string(),
            column_id: column_id.to_string(),
        })
        .map(|_| ())
    }

    pub fn update_task(&mut self, task_id: &str, updates: TaskUpdate) -> Result<(), AppError> {
        self.dispatch(Command::UpdateTask {
            task_id: task_id.to_string(),
            updates,
        })
        .map(|_| ())
    }

    /// Returns whether the board changed.
    pub fn move_task(
        &mut self,
        source: Location,
        destination: Option<Location>,
        task_id: &str,
    ) -> Result<bool, AppError> {
        self.dispatch(Command::MoveTask {
            source,
            destination,
            task_id: task_id.to_string(),
        })
        .map(|dispatched| dispatched.changed)
    }

    /// Confirmation is the caller's job.
    pub fn reset_board(&mut self) -> Result<(), AppError> {
        self.dispatch(Command::ResetBoard).map(|_| ())
    }
}

mod activity;
mod board;
mod task;

pub use activity::{Activity, ActivityKind};
pub use board::{Board, Column, DEFAULT_COLUMNS};
pub use task::{Priority, Task, TaskDraft, TaskUpdate, parse_due_date};

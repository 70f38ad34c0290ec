use serde::{Deserialize, Serialize};

/// Audit record of one board-mutating operation. Titles are snapshots taken
/// when the entry was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    #[serde(flatten)]
    pub kind: ActivityKind,
    pub task_id: String,
    pub task_title: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityKind {
    Created,
    Updated { changes: Vec<String> },
    Deleted,
    Moved { from: String, to: String },
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted => "deleted",
            Self::Moved { .. } => "moved",
        }
    }
}

impl Activity {
    /// One-line human summary, e.g. `moved "Write spec" from To Do to Doing`.
    pub fn summary(&self) -> String {
        match &self.kind {
            ActivityKind::Created => format!("created \"{}\"", self.task_title),
            ActivityKind::Updated { changes } if changes.is_empty() => {
                format!("updated \"{}\"", self.task_title)
            }
            ActivityKind::Updated { changes } => {
                format!("updated \"{}\" ({})", self.task_title, changes.join(", "))
            }
            ActivityKind::Deleted => format!("deleted \"{}\"", self.task_title),
            ActivityKind::Moved { from, to } => {
                format!("moved \"{}\" from {} to {}", self.task_title, from, to)
            }
        }
    }
}

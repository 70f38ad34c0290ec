use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Date;
use time::macros::format_description;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

impl Task {
    /// Calendar due date, or `None` when absent or unparsable.
    pub fn due(&self) -> Option<Date> {
        self.due_date
            .as_deref()
            .and_then(|value| parse_due_date(value).ok())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::invalid_input(format!(
                "unknown priority '{other}' (expected low, medium or high)"
            ))),
        }
    }
}

/// Caller-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
}

impl TaskDraft {
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date<D: Into<String>>(mut self, due_date: D) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn into_task(self, id: String, created_at: String) -> Result<Task, AppError> {
        Ok(Task {
            id,
            title: normalize_title(&self.title)?,
            description: normalize_description(self.description),
            priority: self.priority,
            due_date: normalize_due_date(self.due_date)?,
            tags: normalize_tags(self.tags),
            created_at,
        })
    }
}

/// Partial field set merged onto an existing task. `None` leaves a field
/// untouched; the nested options clear optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Persisted names of the fields present in this update.
    pub fn changed_fields(&self) -> Vec<String> {
        let present = [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("priority", self.priority.is_some()),
            ("dueDate", self.due_date.is_some()),
            ("tags", self.tags.is_some()),
        ];
        present
            .into_iter()
            .filter(|(_, is_present)| *is_present)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub(crate) fn merge_onto(self, task: &Task) -> Result<Task, AppError> {
        let mut merged = task.clone();
        if let Some(title) = self.title {
            merged.title = normalize_title(&title)?;
        }
        if let Some(description) = self.description {
            merged.description = normalize_description(description);
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = normalize_due_date(due_date)?;
        }
        if let Some(tags) = self.tags {
            merged.tags = normalize_tags(tags);
        }
        Ok(merged)
    }
}

pub fn parse_due_date(raw: &str) -> Result<Date, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), format)
        .map_err(|_| AppError::invalid_input("due date must be YYYY-MM-DD"))
}

fn normalize_title(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn normalize_due_date(raw: Option<String>) -> Result<Option<String>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            parse_due_date(value)?;
            Ok(Some(value.to_string()))
        }
    }
}

fn normalize_tags(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

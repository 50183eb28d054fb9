//! Task model shared by the client and the development backend.
//!
//! A [`Task`] is the only entity in the system. Its identifier is assigned by
//! whichever persistence collaborator stores it; its text is validated once,
//! at construction time, through [`TaskText::parse`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors produced while constructing or parsing model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// Task text was empty or whitespace-only.
    #[error("task text cannot be empty")]
    EmptyText,
    /// Priority name is not one of `low`, `medium`, `high`.
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    /// Filter name is not one of `all`, `active`, `done`.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
}

/// Store-assigned primary key of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw key as returned by the store.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated task text: trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskText(String);

impl TaskText {
    /// Trims `raw` and rejects it if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::EmptyText`] for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, TaskError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskError::EmptyText);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the text as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskText {
    type Error = TaskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaskText> for String {
    fn from(text: TaskText) -> Self {
        text.0
    }
}

impl fmt::Display for TaskText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task priority. Serialized as its lower-case name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// The default when the caller does not choose.
    #[default]
    Medium,
    /// Do first.
    High,
}

impl Priority {
    /// Wire name of this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Next priority in the low → medium → high → low cycle.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TaskError::UnknownPriority(other.to_string())),
        }
    }
}

/// A single to-do item.
///
/// `done` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Validated text.
    pub text: TaskText,
    /// Completion flag.
    pub done: bool,
    /// Priority chosen at creation.
    pub priority: Priority,
    /// Creation time as recorded by the store. Used for ordering only.
    pub created_at: DateTime<Utc>,
}

/// Read-only view selector over a task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Every task.
    #[default]
    All,
    /// Tasks not yet done.
    Active,
    /// Completed tasks.
    Done,
}

impl Filter {
    /// All filters in display order.
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Done];

    /// Whether `task` belongs to this view.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.done,
            Self::Done => task.done,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Filter {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "done" => Ok(Self::Done),
            _ => Err(TaskError::UnknownFilter(s.to_string())),
        }
    }
}

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod api;
pub mod controller;
pub mod repository;
pub mod store;
pub mod tags;
pub mod web;

pub use controller::{Notice, NoticeKind, TaskListController};
pub use repository::TaskRepository;
pub use store::{SeaOrmTaskStore, TaskStore};
pub use tags::TagsInput;

/// A single to-do item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<String>,
}

impl Task {
    /// Case-insensitive substring match against the title, priority, status
    /// or any single tag.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.priority.as_str().to_lowercase().contains(&needle)
            || self.status.as_str().to_lowercase().contains(&needle)
            || self
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    /// Returns the due date in long form, e.g. "October 19th, 2026".
    pub fn due_date_label(&self) -> String {
        format_due_date(self.due_date)
    }

    /// Returns the tags joined the way the edit form expects them.
    pub fn tags_label(&self) -> String {
        tags::join_tags(&self.tags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidPriority(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(alias = "completed")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Completed];

    /// Statuses offered when a task is first created.
    pub const ON_CREATE: [Status; 2] = [Status::Pending, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    /// Accepts the canonical names plus the lowercase "completed" alias older
    /// rows were written with.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "completed" {
            return Ok(Status::Completed);
        }
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| ValidationError::InvalidStatus(value.to_string()))
    }
}

/// Raw task fields as submitted by a form or API client.
///
/// Priority and status stay as text until [`TaskInput::validate`] runs, so a
/// bad value is reported as a [`ValidationError`] instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: String,
    pub status: String,
    #[serde(default)]
    pub tags: TagsInput,
}

impl TaskInput {
    /// Checks every field and normalizes tags.
    pub fn validate(self) -> Result<TaskDraft, ValidationError> {
        let priority = self.priority.parse::<Priority>()?;
        let status = self.status.parse::<Status>()?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(TaskDraft {
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority,
            status,
            tags: self.tags.into_tags(),
        })
    }
}

/// A complete, validated set of task fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<String>,
}

/// Rejected input, reported before the store is contacted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid priority value: {0}")]
    InvalidPriority(String),
    #[error("Invalid status value: {0}")]
    InvalidStatus(String),
    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),
    #[error("Title is required")]
    EmptyTitle,
    #[error("Description is required")]
    EmptyDescription,
}

/// Failure reported by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("Task with ID {0} not found")]
    TaskNotFound(i32),
    #[error("Malformed task row {id}: {reason}")]
    MalformedRow { id: i32, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("You must be logged in to manage tasks")]
    AuthRequired,
}

/// Formats a due date in long form with an ordinal day.
pub fn format_due_date(due_date: Option<DateTime<Utc>>) -> String {
    let Some(date) = due_date else {
        return "No due date".to_string();
    };
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}

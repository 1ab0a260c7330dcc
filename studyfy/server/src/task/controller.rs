//! Per-view task list state.
//!
//! A [`TaskListController`] owns the authoritative list of the current user's
//! tasks for one view session, derives the visible (searched) subset, and
//! reconciles the list locally after create, edit and delete so the view does
//! not need a full reload.

use crate::auth::Identity;
use crate::task::repository::TaskRepository;
use crate::task::store::TaskStore;
use crate::task::{Task, TaskError, TaskInput};

const CREATE_LOGIN_MESSAGE: &str = "You must be logged in to create a task.";
const LOGIN_MESSAGE: &str = "You must be logged in to manage tasks.";

/// Progress of the most recent load attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Short user-facing outcome of the last command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// A mutation the user has asked for but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommand {
    Edit(Task),
    Delete(Task),
}

/// Filters `all_tasks` by `query`, keeping their order.
///
/// An empty query shows everything.
pub fn compute_visible(all_tasks: &[Task], query: &str) -> Vec<Task> {
    if query.is_empty() {
        return all_tasks.to_vec();
    }
    all_tasks
        .iter()
        .filter(|task| task.matches_query(query))
        .cloned()
        .collect()
}

pub struct TaskListController<S> {
    repository: TaskRepository<S>,
    identity: Identity,
    all_tasks: Vec<Task>,
    visible_tasks: Vec<Task>,
    query: String,
    load_state: LoadState,
    pending: Option<PendingCommand>,
    notice: Option<Notice>,
}

impl<S: TaskStore> TaskListController<S> {
    pub fn new(repository: TaskRepository<S>, identity: Identity) -> Self {
        Self {
            repository,
            identity,
            all_tasks: Vec::new(),
            visible_tasks: Vec::new(),
            query: String::new(),
            load_state: LoadState::Idle,
            pending: None,
            notice: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn all_tasks(&self) -> &[Task] {
        &self.all_tasks
    }

    pub fn visible_tasks(&self) -> &[Task] {
        &self.visible_tasks
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        self.pending.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn find_task(&self, id: i32) -> Option<&Task> {
        self.all_tasks.iter().find(|task| task.id == id)
    }

    fn user_id(&self) -> Option<String> {
        self.identity.user().map(|user| user.id.clone())
    }

    fn refresh_visible(&mut self) {
        self.visible_tasks = compute_visible(&self.all_tasks, &self.query);
    }

    /// Fetches the user's tasks and replaces the list wholesale.
    ///
    /// A failed attempt keeps whatever list was there before.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), TaskError> {
        let Some(user_id) = self.user_id() else {
            self.load_state = LoadState::Failed(LOGIN_MESSAGE.to_string());
            self.notice = Some(Notice::error(LOGIN_MESSAGE));
            return Err(TaskError::AuthRequired);
        };

        self.load_state = LoadState::Loading;
        match self.repository.list_tasks(&user_id).await {
            Ok(tasks) => {
                self.all_tasks = tasks;
                self.load_state = LoadState::Loaded;
                self.refresh_visible();
                Ok(())
            }
            Err(err) => {
                tracing::error!("Error loading tasks: {}", err);
                self.load_state = LoadState::Failed(err.to_string());
                self.notice = Some(Notice::error("Failed to load tasks."));
                Err(err)
            }
        }
    }

    /// Splices a newly created task into the list, keeping due-date order
    /// with undated tasks last.
    pub fn apply_create(&mut self, task: Task) {
        let key = |task: &Task| (task.due_date.is_none(), task.due_date);
        let new_key = key(&task);
        let position = self
            .all_tasks
            .partition_point(|existing| key(existing) <= new_key);
        self.all_tasks.insert(position, task);
        self.refresh_visible();
    }

    /// Replaces the task with the same ID. Unknown IDs are ignored.
    pub fn apply_edit(&mut self, updated: Task) {
        let Some(slot) = self.all_tasks.iter_mut().find(|task| task.id == updated.id) else {
            return;
        };
        *slot = updated;
        self.refresh_visible();
    }

    /// Removes the task with the given ID. Unknown IDs are ignored.
    pub fn apply_delete(&mut self, id: i32) {
        let Some(position) = self.all_tasks.iter().position(|task| task.id == id) else {
            return;
        };
        self.all_tasks.remove(position);
        self.refresh_visible();
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.refresh_visible();
    }

    pub fn request_edit(&mut self, task: Task) {
        self.pending = Some(PendingCommand::Edit(task));
    }

    pub fn request_delete(&mut self, task: Task) {
        self.pending = Some(PendingCommand::Delete(task));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Creates a task for the current user and splices it into the list.
    #[tracing::instrument(skip(self, input))]
    pub async fn create(&mut self, input: TaskInput) -> Result<Task, TaskError> {
        let Some(user_id) = self.user_id() else {
            self.notice = Some(Notice::error(CREATE_LOGIN_MESSAGE));
            return Err(TaskError::AuthRequired);
        };

        match self.repository.create_task(&user_id, input).await {
            Ok(task) => {
                self.apply_create(task.clone());
                self.notice = Some(Notice::success("Task created successfully!"));
                Ok(task)
            }
            Err(err) => {
                tracing::error!("Error adding task: {}", err);
                self.notice = Some(Notice::error(format!("Failed to create task: {err}")));
                Err(err)
            }
        }
    }

    /// Saves the pending edit with the full replacement fields.
    ///
    /// Returns `Ok(None)` when no edit was pending. The pending edit is
    /// cleared whether or not the store accepts it.
    #[tracing::instrument(skip(self, input))]
    pub async fn submit_edit(&mut self, input: TaskInput) -> Result<Option<Task>, TaskError> {
        let task = match self.pending.take() {
            Some(PendingCommand::Edit(task)) => task,
            other => {
                self.pending = other;
                return Ok(None);
            }
        };
        let Some(user_id) = self.user_id() else {
            self.notice = Some(Notice::error(LOGIN_MESSAGE));
            return Err(TaskError::AuthRequired);
        };

        match self.repository.update_task(&user_id, task.id, input).await {
            Ok(updated) => {
                self.apply_edit(updated.clone());
                self.notice = Some(Notice::success("Task updated successfully"));
                Ok(Some(updated))
            }
            Err(err) => {
                tracing::error!("Error updating task: {}", err);
                self.notice = Some(Notice::error("Failed to update task."));
                Err(err)
            }
        }
    }

    /// Deletes the task pending deletion.
    ///
    /// Returns the removed ID, or `Ok(None)` when no delete was pending. The
    /// pending delete is cleared whether or not the store accepts it.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_delete(&mut self) -> Result<Option<i32>, TaskError> {
        let task = match self.pending.take() {
            Some(PendingCommand::Delete(task)) => task,
            other => {
                self.pending = other;
                return Ok(None);
            }
        };
        let Some(user_id) = self.user_id() else {
            self.notice = Some(Notice::error(LOGIN_MESSAGE));
            return Err(TaskError::AuthRequired);
        };

        match self.repository.delete_task(&user_id, task.id).await {
            Ok(()) => {
                self.apply_delete(task.id);
                self.notice = Some(Notice::success("Task was successfully deleted"));
                Ok(Some(task.id))
            }
            Err(err) => {
                tracing::error!("Error deleting task: {}", err);
                self.notice = Some(Notice::error("Failed to delete task."));
                Err(err)
            }
        }
    }
}

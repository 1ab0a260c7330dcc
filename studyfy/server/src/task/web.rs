use crate::auth::{CurrentUser, Identity};
use crate::task::controller::{LoadState, Notice, TaskListController};
use crate::task::{
    Priority, SeaOrmTaskStore, Status, TagsInput, Task, TaskInput, TaskRepository, TaskStore,
    ValidationError,
};
use askama::Template;
use axum::extract::{Extension, Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct TaskState {
    pub db: Arc<sea_orm::DatabaseConnection>,
}

type Controller<'a> = TaskListController<SeaOrmTaskStore<'a>>;

fn controller(state: &TaskState, current_user: Option<Extension<CurrentUser>>) -> Controller<'_> {
    let identity = Identity::from(current_user.map(|Extension(user)| user));
    TaskListController::new(TaskRepository::new(SeaOrmTaskStore::new(&state.db)), identity)
}

/// Task fields as posted by the create and edit forms.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TaskForm {
    title: String,
    description: String,
    due_date: String,
    priority: String,
    status: String,
    tags: String,
}

impl TaskForm {
    /// Converts the form into task input; the date picker posts `YYYY-MM-DD`
    /// or nothing.
    pub fn into_input(self) -> Result<TaskInput, ValidationError> {
        let due_date = match self.due_date.trim() {
            "" => None,
            text => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|_| ValidationError::InvalidDueDate(text.to_string()))?;
                date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc())
            }
        };
        Ok(TaskInput {
            title: self.title,
            description: self.description,
            due_date,
            priority: self.priority,
            status: self.status,
            tags: TagsInput::Delimited(self.tags),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// Display-ready task row.
pub struct TaskRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub status: String,
    pub tags: Vec<String>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date_label(),
            priority: task.priority.to_string(),
            status: task.status.to_string(),
            tags: task.tags.clone(),
        }
    }
}

pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

fn options<T: Copy + PartialEq>(
    values: &[T],
    current: Option<T>,
    label: fn(&T) -> &'static str,
) -> Vec<SelectOption> {
    values
        .iter()
        .map(|value| SelectOption {
            value: label(value),
            selected: current == Some(*value),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "tasks/tasks_table.html")]
pub struct TasksTableTemplate {
    tasks: Vec<TaskRow>,
    query: String,
    notice: Option<Notice>,
    load_failed: bool,
}

impl TasksTableTemplate {
    fn new<S: TaskStore>(controller: &TaskListController<S>) -> Self {
        Self {
            tasks: controller.visible_tasks().iter().map(TaskRow::from).collect(),
            query: controller.query().to_string(),
            notice: controller.notice().cloned(),
            load_failed: matches!(controller.load_state(), LoadState::Failed(_)),
        }
    }

    fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

#[derive(Template)]
#[template(path = "tasks/todo.html")]
struct TodoTemplate {
    email: String,
    priorities: Vec<SelectOption>,
    statuses: Vec<SelectOption>,
    table: TasksTableTemplate,
}

#[derive(Template)]
#[template(path = "tasks/edit_form.html")]
struct EditFormTemplate {
    id: i32,
    title: String,
    description: String,
    due_date: String,
    tags: String,
    priorities: Vec<SelectOption>,
    statuses: Vec<SelectOption>,
}

impl From<&Task> for EditFormTemplate {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task
                .due_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            tags: task.tags_label(),
            priorities: options(&Priority::ALL, Some(task.priority), Priority::as_str),
            statuses: options(&Status::ALL, Some(task.status), Status::as_str),
        }
    }
}

#[derive(Template)]
#[template(path = "tasks/delete_confirm.html")]
struct DeleteConfirmTemplate {
    id: i32,
    title: String,
}

/// Custom error type for task page handlers.
#[derive(Debug, thiserror::Error)]
pub enum TaskWebError {
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    #[error("Task with ID {0} not found")]
    NotFound(i32),
}

impl axum::response::IntoResponse for TaskWebError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, user_facing_error_message) = match self {
            TaskWebError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "That task no longer exists. Refresh the list and try again.",
            ),
            TaskWebError::Template(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred while processing your request. Please try again later.",
            ),
        };

        (
            status_code,
            Html(format!(
                "<h1>Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

fn render_table(table: TasksTableTemplate) -> Result<Html<String>, TaskWebError> {
    table.render().map(Html).map_err(TaskWebError::from)
}

/// Loads the list, then looks up one task. `Ok(None)` means the load failed
/// and the caller should show the table with the failure notice.
async fn load_task(controller: &mut Controller<'_>, id: i32) -> Result<Option<Task>, TaskWebError> {
    if controller.load().await.is_err() {
        return Ok(None);
    }
    controller
        .find_task(id)
        .cloned()
        .map(Some)
        .ok_or(TaskWebError::NotFound(id))
}

/// Handler for the to-do page with the create form, search box and table.
#[tracing::instrument(skip(state))]
async fn todo_page_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Query(search): Query<SearchQuery>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    // Failures surface through the controller's notice.
    let _ = controller.load().await;
    controller.set_query(search.q);

    let email = controller
        .identity()
        .user()
        .map(|user| user.email.clone())
        .unwrap_or_default();
    let template = TodoTemplate {
        email,
        priorities: options(&Priority::ALL, None, Priority::as_str),
        statuses: options(&Status::ON_CREATE, Some(Status::Pending), Status::as_str),
        table: TasksTableTemplate::new(&controller),
    };
    template.render().map(Html).map_err(TaskWebError::from)
}

/// Handler for the search box; returns the filtered table only.
#[tracing::instrument(skip(state))]
async fn tasks_table_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Query(search): Query<SearchQuery>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    let _ = controller.load().await;
    controller.set_query(search.q);
    render_table(TasksTableTemplate::new(&controller))
}

/// Handler for creating a task via the create form.
#[tracing::instrument(skip(state))]
async fn create_task_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Form(form): Form<TaskForm>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    render_table(create_from_form(&mut controller, form).await)
}

/// Attempts the create even when the list could not be loaded; the create
/// outcome replaces the load notice.
async fn create_from_form<S: TaskStore>(
    controller: &mut TaskListController<S>,
    form: TaskForm,
) -> TasksTableTemplate {
    let _ = controller.load().await;
    match form.into_input() {
        Ok(input) => {
            let _ = controller.create(input).await;
            TasksTableTemplate::new(controller)
        }
        Err(err) => TasksTableTemplate::new(controller)
            .with_notice(Notice::error(format!("Failed to create task: {err}"))),
    }
}

/// Handler for serving the edit form pre-filled from the task.
#[tracing::instrument(skip(state))]
async fn edit_form_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    let Some(task) = load_task(&mut controller, id).await? else {
        return render_table(TasksTableTemplate::new(&controller));
    };
    let template = EditFormTemplate::from(&task);
    template.render().map(Html).map_err(TaskWebError::from)
}

/// Handler for saving the edit form.
#[tracing::instrument(skip(state))]
async fn update_task_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
    Form(form): Form<TaskForm>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    let Some(task) = load_task(&mut controller, id).await? else {
        return render_table(TasksTableTemplate::new(&controller));
    };

    match form.into_input() {
        Ok(input) => {
            controller.request_edit(task);
            let _ = controller.submit_edit(input).await;
            render_table(TasksTableTemplate::new(&controller))
        }
        Err(err) => {
            tracing::error!("Error updating task {}: {}", id, err);
            render_table(
                TasksTableTemplate::new(&controller)
                    .with_notice(Notice::error("Failed to update task.")),
            )
        }
    }
}

/// Handler for the delete confirmation prompt.
#[tracing::instrument(skip(state))]
async fn delete_confirm_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    let Some(task) = load_task(&mut controller, id).await? else {
        return render_table(TasksTableTemplate::new(&controller));
    };
    let template = DeleteConfirmTemplate {
        id: task.id,
        title: task.title,
    };
    template.render().map(Html).map_err(TaskWebError::from)
}

/// Handler for deleting a task once confirmed.
#[tracing::instrument(skip(state))]
async fn delete_task_handler(
    State(state): State<TaskState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, TaskWebError> {
    let mut controller = controller(&state, current_user);
    let Some(task) = load_task(&mut controller, id).await? else {
        return render_table(TasksTableTemplate::new(&controller));
    };
    controller.request_delete(task);
    let _ = controller.confirm_delete().await;
    render_table(TasksTableTemplate::new(&controller))
}

/// Creates and returns the task page router.
pub fn create_task_router(state: TaskState) -> Router {
    Router::new()
        .route("/to-do", get(todo_page_handler))
        .route("/to-do/{email}", get(todo_page_handler))
        .route("/tasks", get(tasks_table_handler).post(create_task_handler))
        .route("/tasks/{id}", post(update_task_handler))
        .route("/tasks/{id}/edit", get(edit_form_handler))
        .route(
            "/tasks/{id}/delete",
            get(delete_confirm_handler).post(delete_task_handler),
        )
        .with_state(state)
}

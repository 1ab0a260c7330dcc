use crate::auth::{CurrentUser, Identity};
use crate::task::web::TaskState;
use crate::task::{
    Priority, SeaOrmTaskStore, Status, StoreError, TagsInput, Task, TaskError, TaskInput,
    TaskListController, TaskRepository,
};
use crate::web::api::ErrorResponse;
use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    /// Unique identifier for the task
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Due date, absent when the task has none
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: Status,
    pub tags: Vec<String>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            tags: task.tags,
        }
    }
}

/// API response for listing tasks.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TasksResponse {
    /// Tasks matching the query, earliest due date first
    pub tasks: Vec<TaskJson>,
    /// Number of tasks returned
    pub count: usize,
}

/// Query parameters for searching tasks.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TasksQuery {
    /// Case-insensitive text matched against title, priority, status and tags
    #[serde(default)]
    q: Option<String>,
}

/// Request body for creating or replacing a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskPayload {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// One of "Low", "Medium" or "High"
    pub priority: String,
    /// One of "Pending", "In Progress" or "Completed"
    pub status: String,
    /// Either a list of tags or a comma separated string
    #[serde(default)]
    #[schema(value_type = Option<Vec<String>>)]
    pub tags: Option<TagsInput>,
}

impl From<TaskPayload> for TaskInput {
    fn from(payload: TaskPayload) -> Self {
        TaskInput {
            title: payload.title,
            description: payload.description,
            due_date: payload.due_date,
            priority: payload.priority,
            status: payload.status,
            tags: payload.tags.unwrap_or_default(),
        }
    }
}

/// Maps task errors onto JSON error responses.
#[derive(Debug)]
pub struct ApiError(TaskError);

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TaskError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            TaskError::Store(StoreError::TaskNotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TaskError::AuthRequired => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            TaskError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Task API failure: {}", self.0);
            "An unexpected error occurred".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

fn repository(state: &TaskState) -> TaskRepository<SeaOrmTaskStore<'_>> {
    TaskRepository::new(SeaOrmTaskStore::new(&state.db))
}

/// Handler for GET /api/v1/tasks - Returns the caller's tasks, optionally searched.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(
        ("q" = Option<String>, Query, description = "Optional search text")
    ),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksResponse>, ApiError> {
    let mut controller =
        TaskListController::new(repository(&state), Identity::Authenticated(user));
    controller.load().await?;
    controller.set_query(query.q.unwrap_or_default());

    let tasks: Vec<TaskJson> = controller
        .visible_tasks()
        .iter()
        .cloned()
        .map(TaskJson::from)
        .collect();
    let count = tasks.len();
    Ok(Json(TasksResponse { tasks, count }))
}

/// Handler for POST /api/v1/tasks - Creates a task for the caller.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = TaskPayload,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 422, description = "Invalid task fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<TaskPayload>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let task = repository(&state)
        .create_task(&user.id, payload.into())
        .await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for PUT /api/v1/tasks/{id} - Replaces every field of a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = TaskPayload,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 422, description = "Invalid task fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<TaskJson>, ApiError> {
    let task = repository(&state)
        .update_task(&user.id, id, payload.into())
        .await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    repository(&state).delete_task(&user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            put(update_task_handler).delete(delete_task_handler),
        )
        .with_state(state)
}

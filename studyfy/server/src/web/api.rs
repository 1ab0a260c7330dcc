use std::sync::Arc;

use crate::{
    auth::{self, AuthState},
    task::{self, web::TaskState},
};

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use utoipa::{OpenApi, ToSchema};

/// Error body returned by every JSON endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        task::api::v1::list_tasks_handler,
        task::api::v1::create_task_handler,
        task::api::v1::update_task_handler,
        task::api::v1::delete_task_handler,
    ),
    components(schemas(
        task::api::v1::TaskJson,
        task::api::v1::TasksResponse,
        task::api::v1::TaskPayload,
        task::Priority,
        task::Status,
        ErrorResponse,
    )),
    tags((name = "Tasks", description = "Manage the signed-in student's to-do list"))
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(auth_state: Arc<AuthState>, task_state: Arc<TaskState>) -> Router {
    let protected_routes = task::api::v1::create_api_router(task_state)
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    Router::new()
        .nest("/api/v1", protected_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            auth_state,
            auth::api::v1::auth_user_middleware,
        )))
}

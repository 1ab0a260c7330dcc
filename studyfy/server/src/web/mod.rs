use askama::Template;
use axum::Router;
use axum::extract::{Extension, State};
use axum::http::{StatusCode, header};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use migration::MigratorTrait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthState, CurrentUser, auth_user_middleware, landing_redirect_middleware};
use crate::config::Config;
use crate::task::web::{TaskState, create_task_router};

pub mod api;

/// Characters escaped in a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Dashboard location for an email taken from a session token.
pub fn dashboard_path(email: &str) -> String {
    format!("/dashboard/{}", utf8_percent_encode(email, PATH_SEGMENT))
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app(config, db);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Assembles every route of the application around an open database.
pub fn create_app(config: Config, db: DatabaseConnection) -> Router {
    let auth_state = Arc::new(AuthState::from_config(&config));
    let config = Arc::new(config);
    let task_state = TaskState { db: Arc::new(db) };

    let protected_routes = Router::new()
        .route("/dashboard/{email}", get(dashboard_handler))
        .merge(create_task_router(task_state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(auth_state.clone(), auth_user_middleware))
                .layer(from_fn(landing_redirect_middleware)),
        );

    let public_routes = Router::new()
        .route("/health", get(health_check_handler))
        .route("/", get(landing_handler))
        .with_state(config)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(auth_state.clone(), auth_user_middleware)),
        );

    let api_routes = api::create_api_router(auth_state, Arc::new(task_state));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([
                    header::AUTHORIZATION,
                    header::COOKIE,
                ]))
                .layer(TraceLayer::new_for_http()),
        )
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

/// Landing page. Signed-in visitors go straight to their dashboard.
#[tracing::instrument(skip(config))]
pub async fn landing_handler(
    State(config): State<Arc<Config>>,
    current_user: Option<Extension<CurrentUser>>,
) -> Result<Response, WebError> {
    if let Some(Extension(user)) = current_user {
        if !user.email.is_empty() {
            return Ok(Redirect::to(&dashboard_path(&user.email)).into_response());
        }
    }

    let template = IndexTemplate {
        sign_in_url: config.sign_in_url.clone(),
        sign_up_url: config.sign_up_url.clone(),
    };
    Ok(template.render().map(Html)?.into_response())
}

#[tracing::instrument]
pub async fn dashboard_handler(
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let template = DashboardTemplate { email: user.email };
    template.render().map(Html).map_err(WebError::from)
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    sign_in_url: String,
    sign_up_url: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    email: String,
}

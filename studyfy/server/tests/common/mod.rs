#![allow(dead_code)]

use axum::body::Body;
use axum::http::Response;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use studyfy_server::auth::{CurrentUser, encode_jwt};
use studyfy_server::config::Config;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

pub const JWT_SECRET: &str = "test_secret";

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Opens a migrated in-memory SQLite database. A single pooled connection
/// keeps every query on the same in-memory database.
pub async fn setup_sqlite() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> Config {
    Config {
        db_url: "sqlite::memory:".to_string(),
        port: 0,
        jwt_secret: JWT_SECRET.to_string(),
        session_cookie: "__session".to_string(),
        sign_in_url: "/sign-in".to_string(),
        sign_up_url: "/sign-up".to_string(),
    }
}

pub fn student() -> CurrentUser {
    CurrentUser::new("user_1".to_string(), "student@example.com".to_string())
}

pub fn classmate() -> CurrentUser {
    CurrentUser::new("user_2".to_string(), "classmate@example.com".to_string())
}

pub fn token_for(user: &CurrentUser) -> String {
    encode_jwt(user, JWT_SECRET).expect("Failed to sign test token")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

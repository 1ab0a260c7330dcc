use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use studyfy_server::auth::CurrentUser;
use studyfy_server::web::create_app;
use tower::ServiceExt;

mod common;

async fn setup_app() -> Router {
    let db = common::setup_sqlite()
        .await
        .expect("Failed to setup test database");
    create_app(common::test_config(), db)
}

fn api_request(method: Method, uri: &str, user: &CurrentUser, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", common::token_for(user)),
        );
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn page_request(method: Method, uri: &str, user: &CurrentUser, form: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri).header(
        header::COOKIE,
        format!("__session={}", common::token_for(user)),
    );
    match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn essay(due_date: Value) -> Value {
    json!({
        "title": "Write essay",
        "description": "History of the printing press",
        "due_date": due_date,
        "priority": "High",
        "status": "Pending",
        "tags": "school, writing"
    })
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&common::body_text(response).await).expect("Body is not JSON")
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = setup_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn api_can_create_list_and_search_tasks() {
    let app = setup_app().await;
    let student = common::student();

    let response = app
        .clone()
        .oneshot(api_request(
            Method::POST,
            "/api/v1/tasks",
            &student,
            Some(essay(json!("2026-10-20T00:00:00Z"))),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["tags"], json!(["school", "writing"]));

    let mut groceries = essay(Value::Null);
    groceries["title"] = json!("Buy groceries");
    groceries["tags"] = json!(["home"]);
    app.clone()
        .oneshot(api_request(
            Method::POST,
            "/api/v1/tasks",
            &student,
            Some(groceries),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(api_request(Method::GET, "/api/v1/tasks", &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed = json_body(response).await;
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["tasks"][0]["title"], "Write essay");
    assert_eq!(listed["tasks"][1]["title"], "Buy groceries");

    let response = app
        .oneshot(api_request(Method::GET, "/api/v1/tasks?q=HOME", &student, None))
        .await
        .unwrap();
    let searched = json_body(response).await;
    assert_eq!(searched["count"], 1);
    assert_eq!(searched["tasks"][0]["title"], "Buy groceries");
}

#[tokio::test]
async fn api_rejects_invalid_priority() {
    let app = setup_app().await;
    let mut body = essay(Value::Null);
    body["priority"] = json!("Urgent");

    let response = app
        .oneshot(api_request(
            Method::POST,
            "/api/v1/tasks",
            &common::student(),
            Some(body),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json_body(response).await["message"],
        "Invalid priority value: Urgent"
    );
}

#[tokio::test]
async fn api_can_update_and_delete_task() {
    let app = setup_app().await;
    let student = common::student();
    let created = json_body(
        app.clone()
            .oneshot(api_request(
                Method::POST,
                "/api/v1/tasks",
                &student,
                Some(essay(Value::Null)),
            ))
            .await
            .unwrap(),
    )
    .await;
    let uri = format!("/api/v1/tasks/{}", created["id"]);

    let mut changed = essay(Value::Null);
    changed["status"] = json!("completed");
    let response = app
        .clone()
        .oneshot(api_request(Method::PUT, &uri, &student, Some(changed)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "Completed");

    let response = app
        .clone()
        .oneshot(api_request(Method::DELETE, &uri, &common::classmate(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(api_request(Method::DELETE, &uri, &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(api_request(Method::DELETE, &uri, &student, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn todo_page_redirects_anonymous_visitors() {
    let app = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/to-do").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn todo_page_can_create_and_search_tasks() {
    let app = setup_app().await;
    let student = common::student();

    let response = app
        .clone()
        .oneshot(page_request(
            Method::POST,
            "/tasks",
            &student,
            Some("title=Write+essay&description=History&due_date=2026-10-20&priority=High&status=Pending&tags=school%2C+writing"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fragment = common::body_text(response).await;
    assert!(fragment.contains("Task created successfully!"));
    assert!(fragment.contains("October 20th, 2026"));

    let page = common::body_text(
        app.clone()
            .oneshot(page_request(Method::GET, "/to-do", &student, None))
            .await
            .unwrap(),
    )
    .await;
    assert!(page.contains("student@example.com"));
    assert!(page.contains("Write essay"));

    let fragment = common::body_text(
        app.oneshot(page_request(Method::GET, "/tasks?q=groceries", &student, None))
            .await
            .unwrap(),
    )
    .await;
    assert!(!fragment.contains("Write essay"));
    assert!(fragment.contains("No tasks match"));
}

#[tokio::test]
async fn todo_page_reports_invalid_form() {
    let app = setup_app().await;

    let response = app
        .oneshot(page_request(
            Method::POST,
            "/tasks",
            &common::student(),
            Some("title=Write+essay&description=History&priority=&status=Pending"),
        ))
        .await
        .unwrap();

    let fragment = common::body_text(response).await;
    assert!(fragment.contains("Failed to create task: Invalid priority value: "));
}

#[tokio::test]
async fn todo_page_can_edit_and_delete_task() {
    let app = setup_app().await;
    let student = common::student();
    app.clone()
        .oneshot(page_request(
            Method::POST,
            "/tasks",
            &student,
            Some("title=Draft&description=First+pass&priority=Low&status=Pending&tags=school"),
        ))
        .await
        .unwrap();
    let listed = json_body(
        app.clone()
            .oneshot(api_request(Method::GET, "/api/v1/tasks", &student, None))
            .await
            .unwrap(),
    )
    .await;
    let id = listed["tasks"][0]["id"].as_i64().unwrap();

    let form = common::body_text(
        app.clone()
            .oneshot(page_request(
                Method::GET,
                &format!("/tasks/{id}/edit"),
                &student,
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(form.contains(r#"value="Draft""#));

    let fragment = common::body_text(
        app.clone()
            .oneshot(page_request(
                Method::POST,
                &format!("/tasks/{id}"),
                &student,
                Some("title=Final&description=Done&priority=High&status=In+Progress&tags=school"),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(fragment.contains("Task updated successfully"));
    assert!(fragment.contains("Final"));

    let confirm = common::body_text(
        app.clone()
            .oneshot(page_request(
                Method::GET,
                &format!("/tasks/{id}/delete"),
                &student,
                None,
            ))
            .await
            .unwrap(),
    )
    .await;
    assert!(confirm.contains("Final"));
    assert!(confirm.contains(&format!(r#"hx-post="/tasks/{id}/delete""#)));

    let fragment = common::body_text(
        app.oneshot(page_request(
            Method::POST,
            &format!("/tasks/{id}/delete"),
            &student,
            None,
        ))
        .await
        .unwrap(),
    )
    .await;
    assert!(fragment.contains("Task was successfully deleted"));
    assert!(fragment.contains("No tasks yet"));
}

#[tokio::test]
async fn edit_form_reports_missing_task() {
    let app = setup_app().await;

    let response = app
        .oneshot(page_request(
            Method::GET,
            "/tasks/999/edit",
            &common::student(),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

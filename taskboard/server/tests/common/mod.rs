// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use taskboard_server::project::ProjectState;
use taskboard_server::store::{DatabaseStore, JsonFileStore};
use taskboard_server::task::TaskState;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt;

/// The persistence backends every endpoint test runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    JsonFile,
    Sqlite,
}

pub const BACKENDS: [Backend; 2] = [Backend::JsonFile, Backend::Sqlite];

/// Test context for endpoint tests.
pub struct TestContext {
    // data dir is kept to ensure it's not dropped
    pub data_dir: Option<tempfile::TempDir>,
    pub app: Router,
}

pub async fn setup_sqlite_db() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_postgres_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Builds the full application on top of a fresh, empty store.
pub async fn setup(backend: Backend) -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();

    let (data_dir, task_state, project_state) = match backend {
        Backend::JsonFile => {
            let dir = tempfile::tempdir()?;
            let store = Arc::new(JsonFileStore::open(dir.path()).await?);
            (
                Some(dir),
                TaskState {
                    tasks: store.clone(),
                    projects: store.clone(),
                },
                ProjectState { projects: store },
            )
        }
        Backend::Sqlite => {
            let store = Arc::new(DatabaseStore::new(setup_sqlite_db().await?));
            (
                None,
                TaskState {
                    tasks: store.clone(),
                    projects: store.clone(),
                },
                ProjectState { projects: store },
            )
        }
    };

    let app = taskboard_server::web::create_app(task_state, project_state);
    Ok(TestContext { data_dir, app })
}

impl TestContext {
    /// Sends a request with an optional raw JSON body and returns the status
    /// together with the decoded JSON response (`Null` for an empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(request.body(body).unwrap()).await
    }

    /// Sends a body without a `content-type` header.
    pub async fn send_untyped(
        &self,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Creates a project through the API and returns its generated id.
    pub async fn create_project(&self, name: &str) -> String {
        let body = serde_json::json!({ "name": name }).to_string();
        let (status, project) = self.send(Method::POST, "/api/projects", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
        project["id"].as_str().unwrap().to_string()
    }

    /// Creates a task through the API and returns its generated id.
    pub async fn create_task(&self, description: &str, id_project: &str) -> String {
        let body =
            serde_json::json!({ "description": description, "idProject": id_project }).to_string();
        let (status, task) = self.send(Method::POST, "/api/tasks", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
        task["id"].as_str().unwrap().to_string()
    }
}

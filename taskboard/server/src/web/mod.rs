use axum::{Json, Router, routing::get};
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::{self, Config, StorageBackend};
use crate::project::ProjectState;
use crate::store::{DatabaseStore, JsonFileStore};
use crate::task::TaskState;

pub mod api;
pub mod middleware;

/// Opens the configured store and builds the router state around it.
#[tracing::instrument(skip(config))]
pub async fn open_stores(config: &Config) -> anyhow::Result<(TaskState, ProjectState)> {
    match config.storage {
        StorageBackend::File => {
            let store = Arc::new(JsonFileStore::open(&config.data_dir).await?);
            Ok((
                TaskState {
                    tasks: store.clone(),
                    projects: store.clone(),
                },
                ProjectState { projects: store },
            ))
        }
        StorageBackend::Database => {
            let db_url = config
                .db_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DB_URL must be set when STORAGE=database"))?;
            let db = Database::connect(db_url).await?;
            migration::Migrator::up(&db, None).await?;
            tracing::info!("Database migrations applied successfully");

            let store = Arc::new(DatabaseStore::new(db));
            Ok((
                TaskState {
                    tasks: store.clone(),
                    projects: store.clone(),
                },
                ProjectState { projects: store },
            ))
        }
    }
}

/// Assembles the full application: API routes, health check and OpenAPI
/// document, wrapped in request tracing and permissive CORS.
pub fn create_app(task_state: TaskState, project_state: ProjectState) -> Router {
    Router::new()
        .route("/health", get(health_check_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .merge(api::create_api_router(task_state, project_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    let (task_state, project_state) = open_stores(&config).await?;
    let app = create_app(task_state, project_state);

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(api::ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn file_backed_app() -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            port: 0,
            storage: StorageBackend::File,
            data_dir: dir.path().to_path_buf(),
            db_url: None,
        };
        let (task_state, project_state) = open_stores(&config).await.unwrap();
        (dir, create_app(task_state, project_state))
    }

    #[tokio::test]
    async fn can_check_health_endpoint() {
        let (_dir, app) = file_backed_app().await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn can_serve_openapi_document() {
        let (_dir, app) = file_backed_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["info"]["title"], "Task manager API");
        assert!(doc["paths"]["/api/tasks"]["post"].is_object());
    }

    #[tokio::test]
    async fn can_answer_cors_preflight() {
        let (_dir, app) = file_backed_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/tasks")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&axum::http::HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn can_refuse_database_backend_without_url() {
        let config = Config {
            port: 0,
            storage: StorageBackend::Database,
            data_dir: "data".into(),
            db_url: None,
        };

        let err = open_stores(&config).await.err().unwrap();

        assert_eq!(err.to_string(), "DB_URL must be set when STORAGE=database");
    }
}

use axum::{
    Json, Router,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tower::ServiceBuilder;
use utoipa::{OpenApi, ToSchema};

use crate::project::{self, ProjectState};
use crate::task::{self, TaskState};

/// Message returned for any request body that is not the JSON we expect.
pub const INVALID_JSON_FORMAT: &str = "Invalid JSON format";

/// JSON body of every API error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// An error response: a status code plus the message sent as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// `Json` extractor whose rejection is the API's own 400 error body instead of
/// axum's plain-text rejection.
///
/// A body not declared as JSON is read as an empty object, so the handler's
/// required-field check reports what is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => serde_json::from_str("{}")
                .map(Self)
                .map_err(|_| ApiError::bad_request(INVALID_JSON_FORMAT)),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection.body_text());
                Err(ApiError::bad_request(INVALID_JSON_FORMAT))
            }
        }
    }
}

/// Treats absent and empty strings alike, so `""` fails a required-field check.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task manager API",
        version = "1.0.0",
        description = "An API to handle task management"
    ),
    paths(
        task::api::v1::get_tasks_handler,
        task::api::v1::create_task_handler,
        task::api::v1::mark_task_done_handler,
        task::api::v1::mark_task_not_done_handler,
        task::api::v1::delete_task_handler,
        project::api::v1::get_projects_handler,
        project::api::v1::get_project_handler,
        project::api::v1::create_project_handler,
        project::api::v1::update_project_handler,
        project::api::v1::delete_project_handler,
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "Tasks", description = "Task management"),
        (name = "Projects", description = "Project management")
    )
)]
pub struct ApiDoc;

/// Creates the `/api` routes for tasks and projects. Every POST and PUT body
/// is checked for well-formed JSON before it reaches a handler.
pub fn create_api_router(task_state: TaskState, project_state: ProjectState) -> Router {
    let tasks_router = task::api::v1::create_api_router(task_state);
    let projects_router = project::api::v1::create_api_router(project_state);
    let api_routes = tasks_router
        .merge(projects_router)
        .layer(ServiceBuilder::new().layer(from_fn(super::middleware::reject_malformed_json)));
    Router::new().nest("/api", api_routes)
}

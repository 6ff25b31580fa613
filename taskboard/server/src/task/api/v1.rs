use crate::task::{Task, TaskService, TaskServiceError, TaskState};
use crate::web::api::{ApiError, ApiJson, ErrorResponse, non_empty};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Messages of the service errors raised when an id does not resolve.
const PROJECT_ID_DOES_NOT_EXIST: &str = "Project id does not exist";
const TASK_ID_DOES_NOT_EXIST: &str = "Task id does not exist";
const TASK_NOT_FOUND: &str = "Task not found";

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier, generated from the creation time
    id: String,
    /// What needs doing
    description: String,
    /// Whether the task is done
    completed: bool,
    /// ID of the project the task belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    id_project: Option<String>,
    /// When the task was created
    created_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id().to_string(),
            description: task.description().to_string(),
            completed: task.completed(),
            id_project: task.id_project().map(str::to_string),
            created_at: task.created_at(),
        }
    }
}

/// Request body for creating a task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// What needs doing
    #[serde(default)]
    description: Option<String>,
    /// ID of an existing project
    #[serde(default)]
    id_project: Option<String>,
}

/// Maps a failed task mutation onto a response. An unresolved task id is a
/// 404; anything else is reported with the error's own generic message.
fn task_mutation_error(id: &str, action: &str, err: TaskServiceError) -> ApiError {
    let message = err.to_string();
    if message == TASK_ID_DOES_NOT_EXIST {
        ApiError::not_found(TASK_NOT_FOUND)
    } else {
        tracing::error!("Failed to {} task {}: {:?}", action, id, err);
        ApiError::internal(message)
    }
}

/// Handler for GET /api/tasks - Returns all tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Task list", body = Vec<TaskJson>),
        (status = 500, description = "Failed to load tasks", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<TaskState>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    let service = TaskService::new(state.tasks.as_ref(), state.projects.as_ref());

    match service.get_tasks().await {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(TaskJson::from).collect())),
        Err(err) => {
            tracing::error!("Failed to get tasks: {:?}", err);
            Err(ApiError::internal("Failed to load tasks"))
        }
    }
}

/// Handler for POST /api/tasks - Creates a task in an existing project.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Invalid request or unknown project", body = ErrorResponse),
        (status = 500, description = "Database operation failed", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<TaskState>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let (Some(description), Some(id_project)) =
        (non_empty(payload.description), non_empty(payload.id_project))
    else {
        return Err(ApiError::bad_request(
            "Description and idProject are required",
        ));
    };
    let service = TaskService::new(state.tasks.as_ref(), state.projects.as_ref());

    match service.create_task(description, id_project).await {
        Ok(task) => Ok((StatusCode::CREATED, Json(TaskJson::from(task)))),
        Err(err) => {
            let message = err.to_string();
            if message == PROJECT_ID_DOES_NOT_EXIST {
                Err(ApiError::bad_request(message))
            } else {
                tracing::error!("Failed to create task: {:?}", err);
                Err(ApiError::internal(message))
            }
        }
    }
}

/// Handler for PUT /api/tasks/mark-done/{id} - Marks a task completed.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/tasks/mark-done/{id}",
    params(
        ("id" = String, Path, description = "The ID of the task")
    ),
    responses(
        (status = 200, description = "Task completed", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Database operation failed", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn mark_task_done_handler(
    State(state): State<TaskState>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let service = TaskService::new(state.tasks.as_ref(), state.projects.as_ref());

    service
        .mark_task_done(&id)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| task_mutation_error(&id, "mark done", err))
}

/// Handler for PUT /api/tasks/mark-not-done/{id} - Marks a task not completed.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/tasks/mark-not-done/{id}",
    params(
        ("id" = String, Path, description = "The ID of the task")
    ),
    responses(
        (status = 200, description = "Task marked as not done", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Database operation failed", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn mark_task_not_done_handler(
    State(state): State<TaskState>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let service = TaskService::new(state.tasks.as_ref(), state.projects.as_ref());

    service
        .mark_task_not_done(&id)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| task_mutation_error(&id, "mark not done", err))
}

/// Handler for DELETE /api/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id" = String, Path, description = "The ID of the task to delete")
    ),
    responses(
        (status = 200, description = "Task deleted", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Database operation failed", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<TaskState>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let service = TaskService::new(state.tasks.as_ref(), state.projects.as_ref());

    service
        .delete_task(&id)
        .await
        .map(|task| Json(TaskJson::from(task)))
        .map_err(|err| task_mutation_error(&id, "delete", err))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: TaskState) -> Router {
    Router::new()
        .route("/tasks", get(get_tasks_handler).post(create_task_handler))
        .route("/tasks/mark-done/{id}", put(mark_task_done_handler))
        .route("/tasks/mark-not-done/{id}", put(mark_task_not_done_handler))
        .route("/tasks/{id}", delete(delete_task_handler))
        .with_state(state)
}

use crate::project::{Project, ProjectService, ProjectState};
use crate::web::api::{ApiError, ApiJson, ErrorResponse, non_empty};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message of the service error raised when a project id does not resolve.
const PROJECT_ID_DOES_NOT_EXIST: &str = "Project id does not exist";
const PROJECT_NOT_FOUND: &str = "Project not found";

/// JSON representation of a Project for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectJson {
    /// Unique identifier, generated from the creation time
    id: String,
    /// Name of the project
    name: String,
}

impl From<Project> for ProjectJson {
    fn from(project: Project) -> Self {
        Self {
            id: project.id().to_string(),
            name: project.name().to_string(),
        }
    }
}

/// Request body for creating a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// Name of the new project
    #[serde(default)]
    name: Option<String>,
}

/// Request body for renaming a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    /// The id of the project
    #[serde(default)]
    id: Option<String>,
    /// The new name of the project
    #[serde(default)]
    name: Option<String>,
}

/// Handler for GET /api/projects - Returns all projects.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "A list of projects", body = Vec<ProjectJson>),
        (status = 500, description = "Failed to load projects", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_projects_handler(
    State(state): State<ProjectState>,
) -> Result<Json<Vec<ProjectJson>>, ApiError> {
    let service = ProjectService::new(state.projects.as_ref());

    match service.get_projects().await {
        Ok(projects) => Ok(Json(projects.into_iter().map(ProjectJson::from).collect())),
        Err(err) => {
            tracing::error!("Failed to get projects: {:?}", err);
            Err(ApiError::internal("Failed to load projects"))
        }
    }
}

/// Handler for GET /api/projects/{id} - Returns a single project.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = String, Path, description = "The ID of the project")
    ),
    responses(
        (status = 200, description = "The project", body = ProjectJson),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Failed to load project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project_handler(
    State(state): State<ProjectState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectJson>, ApiError> {
    let service = ProjectService::new(state.projects.as_ref());

    match service.get_project_by_id(&id).await {
        Ok(Some(project)) => Ok(Json(ProjectJson::from(project))),
        Ok(None) => Err(ApiError::not_found(PROJECT_NOT_FOUND)),
        Err(err) => {
            tracing::error!("Failed to get project {}: {:?}", id, err);
            Err(ApiError::internal("Failed to load project"))
        }
    }
}

/// Handler for POST /api/projects - Creates a project.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectJson),
        (status = 400, description = "Missing project name or malformed body", body = ErrorResponse),
        (status = 500, description = "Failed to create project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project_handler(
    State(state): State<ProjectState>,
    ApiJson(payload): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectJson>), ApiError> {
    let Some(name) = non_empty(payload.name) else {
        return Err(ApiError::bad_request("Project name is required"));
    };
    let service = ProjectService::new(state.projects.as_ref());

    match service.create_project(name).await {
        Ok(project) => Ok((StatusCode::CREATED, Json(ProjectJson::from(project)))),
        Err(err) => {
            tracing::error!("Failed to create project: {:?}", err);
            Err(ApiError::internal("Failed to create project"))
        }
    }
}

/// Handler for PUT /api/projects - Renames a project.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/projects",
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ProjectJson),
        (status = 400, description = "Missing project ID or name, or malformed body", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Failed to update project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn update_project_handler(
    State(state): State<ProjectState>,
    ApiJson(payload): ApiJson<UpdateProjectRequest>,
) -> Result<Json<ProjectJson>, ApiError> {
    let (Some(id), Some(name)) = (non_empty(payload.id), non_empty(payload.name)) else {
        return Err(ApiError::bad_request("Project ID and name are required"));
    };
    let service = ProjectService::new(state.projects.as_ref());

    match service.update_project(&id, name).await {
        Ok(Some(project)) => Ok(Json(ProjectJson::from(project))),
        Ok(None) => Err(ApiError::not_found(PROJECT_NOT_FOUND)),
        Err(err) => {
            let message = err.to_string();
            if message == PROJECT_ID_DOES_NOT_EXIST {
                Err(ApiError::not_found(PROJECT_NOT_FOUND))
            } else {
                tracing::error!("Failed to update project {}: {:?}", id, err);
                Err(ApiError::internal(message))
            }
        }
    }
}

/// Handler for DELETE /api/projects/{id} - Deletes a project.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = String, Path, description = "The ID of the project to delete")
    ),
    responses(
        (status = 200, description = "Project deleted successfully", body = ProjectJson),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 500, description = "Failed to delete project", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn delete_project_handler(
    State(state): State<ProjectState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectJson>, ApiError> {
    let service = ProjectService::new(state.projects.as_ref());

    match service.delete_project(&id).await {
        Ok(Some(project)) => Ok(Json(ProjectJson::from(project))),
        Ok(None) => Err(ApiError::not_found(PROJECT_NOT_FOUND)),
        Err(err) => {
            tracing::error!("Failed to delete project {}: {:?}", id, err);
            Err(ApiError::internal("Failed to delete project"))
        }
    }
}

/// Creates and returns the projects API router.
pub fn create_api_router(state: ProjectState) -> Router {
    Router::new()
        .route(
            "/projects",
            get(get_projects_handler)
                .post(create_project_handler)
                .put(update_project_handler),
        )
        .route(
            "/projects/{id}",
            get(get_project_handler).delete(delete_project_handler),
        )
        .with_state(state)
}

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{ProjectStore, StoreError};

pub mod api;

/// A named grouping that tasks may reference.
#[derive(Debug, PartialEq, Clone, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    id: String,
    name: String,
}

impl Project {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name }
    }

    /// Returns the ID of the project.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the name of the project.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: String) {
        self.name = name;
    }
}

/// Router state for the project endpoints.
#[derive(Clone)]
pub struct ProjectState {
    pub projects: Arc<dyn ProjectStore>,
}

/// Error type for ProjectService operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    /// Represents an update aimed at a project that does not exist.
    #[error("Project id does not exist")]
    ProjectNotFound(String),
    /// Represents a failure in the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ProjectService<'a> {
    store: &'a dyn ProjectStore,
}

impl<'a> ProjectService<'a> {
    pub fn new(store: &'a dyn ProjectStore) -> Self {
        Self { store }
    }

    /// Retrieves all projects.
    #[tracing::instrument(skip(self))]
    pub async fn get_projects(&self) -> Result<Vec<Project>, ProjectServiceError> {
        Ok(self.store.list().await?)
    }

    /// Retrieves a project by its ID, or `None` if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_project_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Project>, ProjectServiceError> {
        Ok(self.store.get_by_id(id).await?)
    }

    /// Creates a new project.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the project.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Project` with its generated ID.
    #[tracing::instrument(skip(self))]
    pub async fn create_project(&self, name: String) -> Result<Project, ProjectServiceError> {
        Ok(self.store.insert(name).await?)
    }

    /// Renames an existing project.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the project to rename.
    /// * `name` - The new name for the project.
    ///
    /// # Returns
    ///
    /// The updated `Project`, `None` if the project vanished between the
    /// lookup and the write, or `ProjectNotFound` if the ID never resolved.
    #[tracing::instrument(skip(self))]
    pub async fn update_project(
        &self,
        id: &str,
        name: String,
    ) -> Result<Option<Project>, ProjectServiceError> {
        if self.store.get_by_id(id).await?.is_none() {
            return Err(ProjectServiceError::ProjectNotFound(id.to_string()));
        }
        Ok(self.store.update(id, name).await?)
    }

    /// Deletes a project by its ID and returns it.
    ///
    /// Unlike the task operations this does not treat an unknown ID as an
    /// error: it returns `Ok(None)`. Tasks referencing the project are left
    /// untouched.
    #[tracing::instrument(skip(self))]
    pub async fn delete_project(
        &self,
        id: &str,
    ) -> Result<Option<Project>, ProjectServiceError> {
        Ok(self.store.remove(id).await?)
    }
}

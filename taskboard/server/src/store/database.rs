use async_trait::async_trait;
use sea_orm::*;

use super::{ProjectStore, StoreError, TaskStore, TimestampIds};
use crate::entities::{project, task};
use crate::project::Project;
use crate::task::{NewTask, Task};

impl From<project::Model> for Project {
    fn from(model: project::Model) -> Self {
        Project::new(model.id, model.name)
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.description,
            model.completed,
            model.id_project,
            model.created_at,
        )
    }
}

/// Stores tasks and projects in a relational database through sea-orm.
///
/// The connection is handed in by the caller, which keeps the store usable
/// against any database the caller has set up (including test databases).
#[derive(Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
    ids: TimestampIds,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            ids: TimestampIds::new(),
        }
    }
}

#[async_trait]
impl ProjectStore for DatabaseStore {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let projects = project::Entity::find()
            .order_by_asc(project::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Project::from)
            .collect();
        Ok(projects)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let project = project::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(project.map(Project::from))
    }

    #[tracing::instrument(skip(self))]
    async fn insert(&self, name: String) -> Result<Project, StoreError> {
        let active_model = project::ActiveModel {
            id: ActiveValue::Set(self.ids.next_id(chrono::Utc::now())),
            name: ActiveValue::Set(name),
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Project::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: &str, name: String) -> Result<Option<Project>, StoreError> {
        let Some(project_to_update) = project::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model: project::ActiveModel = project_to_update.into();
        active_model.name = ActiveValue::Set(name);
        let updated_model = active_model.update(&self.db).await?;
        Ok(Some(Project::from(updated_model)))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let Some(project_to_delete) = project::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        project::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(Some(Project::from(project_to_delete)))
    }
}

#[async_trait]
impl TaskStore for DatabaseStore {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = task::Entity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let task = task::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?;
        Ok(task.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn insert(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let created_at = chrono::Utc::now();
        let active_model = task::ActiveModel {
            id: ActiveValue::Set(self.ids.next_id(created_at)),
            description: ActiveValue::Set(new_task.description),
            completed: ActiveValue::Set(false),
            id_project: ActiveValue::Set(Some(new_task.id_project)),
            created_at: ActiveValue::Set(created_at),
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn set_completed(&self, id: &str, completed: bool) -> Result<Option<Task>, StoreError> {
        let Some(task_to_update) = task::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model: task::ActiveModel = task_to_update.into();
        active_model.completed = ActiveValue::Set(completed);
        let updated_model = active_model.update(&self.db).await?;
        Ok(Some(Task::from(updated_model)))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let Some(task_to_delete) = task::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        task::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(Some(Task::from(task_to_delete)))
    }
}

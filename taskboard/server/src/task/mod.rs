use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{ProjectStore, StoreError, TaskStore};

pub mod api;

/// A to-do item, usually belonging to a project.
#[derive(Debug, PartialEq, Clone, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: String,
    description: String,
    #[serde(default)]
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_project: Option<String>,
    #[serde(default)]
    created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: String,
        description: String,
        completed: bool,
        id_project: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description,
            completed,
            id_project,
            created_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the ID of the project this task belongs to, if any.
    pub fn id_project(&self) -> Option<&str> {
        self.id_project.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

/// The fields a caller supplies when creating a task.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub description: String,
    pub id_project: String,
}

/// Router state for the task endpoints. Task creation needs the project
/// store to check that the referenced project exists.
#[derive(Clone)]
pub struct TaskState {
    pub tasks: Arc<dyn TaskStore>,
    pub projects: Arc<dyn ProjectStore>,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Represents a task that references a project which does not exist.
    #[error("Project id does not exist")]
    ProjectNotFound(String),
    /// Represents an operation on a task which does not exist.
    #[error("Task id does not exist")]
    TaskNotFound(String),
    /// Represents a failure in the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct TaskService<'a> {
    tasks: &'a dyn TaskStore,
    projects: &'a dyn ProjectStore,
}

impl<'a> TaskService<'a> {
    pub fn new(tasks: &'a dyn TaskStore, projects: &'a dyn ProjectStore) -> Self {
        Self { tasks, projects }
    }

    /// Retrieves all tasks.
    #[tracing::instrument(skip(self))]
    pub async fn get_tasks(&self) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.tasks.list().await?)
    }

    /// Creates a new, not yet completed task.
    ///
    /// # Arguments
    ///
    /// * `description` - What needs doing.
    /// * `id_project` - The ID of the project the task belongs to. It must exist.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Task`, or `ProjectNotFound` if the
    /// referenced project does not exist. Nothing is stored in that case.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        description: String,
        id_project: String,
    ) -> Result<Task, TaskServiceError> {
        if self.projects.get_by_id(&id_project).await?.is_none() {
            return Err(TaskServiceError::ProjectNotFound(id_project));
        }

        let task = self
            .tasks
            .insert(NewTask {
                description,
                id_project,
            })
            .await?;
        Ok(task)
    }

    /// Marks a task as completed. Marking an already completed task is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn mark_task_done(&self, id: &str) -> Result<Task, TaskServiceError> {
        self.set_completed(id, true).await
    }

    /// Marks a task as not completed. Marking an open task is a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn mark_task_not_done(&self, id: &str) -> Result<Task, TaskServiceError> {
        self.set_completed(id, false).await
    }

    /// Deletes a task by its ID.
    ///
    /// # Returns
    ///
    /// The deleted `Task`, or `TaskNotFound` if there is no task with that ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: &str) -> Result<Task, TaskServiceError> {
        if self.tasks.get_by_id(id).await?.is_none() {
            return Err(TaskServiceError::TaskNotFound(id.to_string()));
        }
        self.tasks
            .remove(id)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))
    }

    async fn set_completed(&self, id: &str, completed: bool) -> Result<Task, TaskServiceError> {
        if self.tasks.get_by_id(id).await?.is_none() {
            return Err(TaskServiceError::TaskNotFound(id.to_string()));
        }
        self.tasks
            .set_completed(id, completed)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;
    use crate::store::{MockProjectStore, MockTaskStore};
    use chrono::TimeZone;

    fn created_at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_722_470_400_500).unwrap()
    }

    fn open_task() -> Task {
        Task::new(
            "1722470400500".to_string(),
            "Write report".to_string(),
            false,
            Some("1722470400000".to_string()),
            created_at(),
        )
    }

    #[tokio::test]
    async fn can_create_task_for_existing_project() {
        let mut projects = MockProjectStore::new();
        projects
            .expect_get_by_id()
            .withf(|id| id == "1722470400000")
            .returning(|id| Ok(Some(Project::new(id.to_string(), "Acme".to_string()))));
        let mut tasks = MockTaskStore::new();
        tasks
            .expect_insert()
            .withf(|new_task| {
                new_task.description == "Write report" && new_task.id_project == "1722470400000"
            })
            .times(1)
            .returning(|_| Ok(open_task()));

        let service = TaskService::new(&tasks, &projects);
        let task = service
            .create_task("Write report".to_string(), "1722470400000".to_string())
            .await
            .unwrap();

        assert_eq!(task, open_task());
        assert!(!task.completed());
    }

    #[tokio::test]
    async fn can_reject_task_for_unknown_project_without_inserting() {
        let mut projects = MockProjectStore::new();
        projects.expect_get_by_id().returning(|_| Ok(None));
        let mut tasks = MockTaskStore::new();
        tasks.expect_insert().never();

        let service = TaskService::new(&tasks, &projects);
        let err = service
            .create_task("Write report".to_string(), "nope".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskServiceError::ProjectNotFound(ref id) if id == "nope"));
        assert_eq!(err.to_string(), "Project id does not exist");
    }

    #[tokio::test]
    async fn can_mark_task_done() {
        let projects = MockProjectStore::new();
        let mut tasks = MockTaskStore::new();
        tasks.expect_get_by_id().returning(|_| Ok(Some(open_task())));
        tasks
            .expect_set_completed()
            .withf(|id, completed| id == "1722470400500" && *completed)
            .times(1)
            .returning(|_, completed| {
                let mut task = open_task();
                task.set_completed(completed);
                Ok(Some(task))
            });

        let service = TaskService::new(&tasks, &projects);
        let task = service.mark_task_done("1722470400500").await.unwrap();

        assert!(task.completed());
    }

    #[tokio::test]
    async fn can_mark_task_not_done() {
        let projects = MockProjectStore::new();
        let mut tasks = MockTaskStore::new();
        tasks.expect_get_by_id().returning(|_| {
            let mut task = open_task();
            task.set_completed(true);
            Ok(Some(task))
        });
        tasks
            .expect_set_completed()
            .withf(|_, completed| !*completed)
            .returning(|_, _| Ok(Some(open_task())));

        let service = TaskService::new(&tasks, &projects);
        let task = service.mark_task_not_done("1722470400500").await.unwrap();

        assert!(!task.completed());
    }

    #[tokio::test]
    async fn can_reject_marking_unknown_task_without_writing() {
        let projects = MockProjectStore::new();
        let mut tasks = MockTaskStore::new();
        tasks.expect_get_by_id().returning(|_| Ok(None));
        tasks.expect_set_completed().never();

        let service = TaskService::new(&tasks, &projects);
        let err = service.mark_task_done("missing").await.unwrap_err();

        assert!(matches!(err, TaskServiceError::TaskNotFound(_)));
        assert_eq!(err.to_string(), "Task id does not exist");
    }

    #[tokio::test]
    async fn can_reject_deleting_unknown_task() {
        let projects = MockProjectStore::new();
        let mut tasks = MockTaskStore::new();
        tasks.expect_get_by_id().returning(|_| Ok(None));
        tasks.expect_remove().never();

        let service = TaskService::new(&tasks, &projects);
        let err = service.delete_task("missing").await.unwrap_err();

        assert_eq!(err.to_string(), "Task id does not exist");
    }

    #[tokio::test]
    async fn can_surface_store_failure_during_project_check() {
        let mut projects = MockProjectStore::new();
        projects
            .expect_get_by_id()
            .returning(|_| Err(StoreError::from(std::io::Error::other("unreadable"))));
        let tasks = MockTaskStore::new();

        let service = TaskService::new(&tasks, &projects);
        let err = service
            .create_task("Write report".to_string(), "1722470400000".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskServiceError::Store(_)));
        assert_eq!(err.to_string(), "Database operation failed");
    }

    #[test]
    fn can_load_legacy_record_without_project_or_timestamp() {
        let task: Task =
            serde_json::from_str(r#"{"id":"1","description":"Old","completed":true}"#).unwrap();

        assert_eq!(task.id_project(), None);
        assert!(task.completed());
        assert_eq!(task.created_at(), DateTime::<Utc>::default());
    }
}

//! Flat-file backend: each entity lives in its own JSON array file which is
//! read whole, mutated in memory and written back whole.
//!
//! Every read-modify-write holds that file's mutex for its full duration, so
//! overlapping requests are applied one after another rather than racing.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::{ProjectStore, StoreError, TaskStore, TimestampIds};
use crate::project::Project;
use crate::task::{NewTask, Task};

const TASKS_FILE: &str = "tasks.json";
const PROJECTS_FILE: &str = "projects.json";

/// One JSON array file plus the lock that makes its owner the single writer.
#[derive(Debug)]
struct Collection {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Collection {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Reads the whole collection. A missing file is an empty collection.
    async fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Replaces the file contents with `records`, going through a temporary
    /// file so a crash mid-write never leaves a truncated collection behind.
    async fn save<T: Serialize>(&self, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// Stores tasks and projects in `tasks.json` and `projects.json`.
#[derive(Debug)]
pub struct JsonFileStore {
    tasks: Collection,
    projects: Collection,
    ids: TimestampIds,
}

impl JsonFileStore {
    /// Opens a store rooted at `data_dir`, creating the directory if needed.
    /// The data files themselves are created on the first write.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;
        tracing::info!("Using JSON file store in {}", data_dir.display());
        Ok(Self {
            tasks: Collection::new(data_dir.join(TASKS_FILE)),
            projects: Collection::new(data_dir.join(PROJECTS_FILE)),
            ids: TimestampIds::new(),
        })
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let _guard = self.projects.lock.lock().await;
        self.projects.load().await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let _guard = self.projects.lock.lock().await;
        let projects: Vec<Project> = self.projects.load().await?;
        Ok(projects.into_iter().find(|p| p.id() == id))
    }

    #[tracing::instrument(skip(self))]
    async fn insert(&self, name: String) -> Result<Project, StoreError> {
        let _guard = self.projects.lock.lock().await;
        let mut projects: Vec<Project> = self.projects.load().await?;
        let project = Project::new(self.ids.next_id(chrono::Utc::now()), name);
        projects.push(project.clone());
        self.projects.save(&projects).await?;
        Ok(project)
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, id: &str, name: String) -> Result<Option<Project>, StoreError> {
        let _guard = self.projects.lock.lock().await;
        let mut projects: Vec<Project> = self.projects.load().await?;
        let Some(project) = projects.iter_mut().find(|p| p.id() == id) else {
            return Ok(None);
        };
        project.rename(name);
        let updated = project.clone();
        self.projects.save(&projects).await?;
        Ok(Some(updated))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let _guard = self.projects.lock.lock().await;
        let mut projects: Vec<Project> = self.projects.load().await?;
        let Some(index) = projects.iter().position(|p| p.id() == id) else {
            return Ok(None);
        };
        let removed = projects.remove(index);
        self.projects.save(&projects).await?;
        Ok(Some(removed))
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let _guard = self.tasks.lock.lock().await;
        self.tasks.load().await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let _guard = self.tasks.lock.lock().await;
        let tasks: Vec<Task> = self.tasks.load().await?;
        Ok(tasks.into_iter().find(|t| t.id() == id))
    }

    #[tracing::instrument(skip(self))]
    async fn insert(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let _guard = self.tasks.lock.lock().await;
        let mut tasks: Vec<Task> = self.tasks.load().await?;
        let created_at = chrono::Utc::now();
        let task = Task::new(
            self.ids.next_id(created_at),
            new_task.description,
            false,
            Some(new_task.id_project),
            created_at,
        );
        tasks.push(task.clone());
        self.tasks.save(&tasks).await?;
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    async fn set_completed(&self, id: &str, completed: bool) -> Result<Option<Task>, StoreError> {
        let _guard = self.tasks.lock.lock().await;
        let mut tasks: Vec<Task> = self.tasks.load().await?;
        let Some(task) = tasks.iter_mut().find(|t| t.id() == id) else {
            return Ok(None);
        };
        task.set_completed(completed);
        let updated = task.clone();
        self.tasks.save(&tasks).await?;
        Ok(Some(updated))
    }

    #[tracing::instrument(skip(self))]
    async fn remove(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let _guard = self.tasks.lock.lock().await;
        let mut tasks: Vec<Task> = self.tasks.load().await?;
        let Some(index) = tasks.iter().position(|t| t.id() == id) else {
            return Ok(None);
        };
        let removed = tasks.remove(index);
        self.tasks.save(&tasks).await?;
        Ok(Some(removed))
    }
}

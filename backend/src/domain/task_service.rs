//! Task domain service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    CreateTaskRequest, MoveTaskRequest, SectionRef, TaskCommand, TaskQuery, TaskRef,
    TaskRepository, TaskRepositoryError, UpdateTaskRequest,
};
use crate::domain::section_service::section_not_found;
use crate::domain::{Error, Task, TaskDraft};

fn map_repository_error(error: TaskRepositoryError) -> Error {
    match error {
        TaskRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("task repository unavailable: {message}"))
        }
        TaskRepositoryError::Query { message } => {
            Error::internal(format!("task repository error: {message}"))
        }
        TaskRepositoryError::SectionNotFound { section_id } => section_not_found(section_id),
        TaskRepositoryError::NotFound { task_id } => {
            Error::not_found(format!("task {task_id} not found"))
        }
    }
}

/// Task service implementing the command and query driving ports.
#[derive(Clone)]
pub struct TaskService<R> {
    task_repo: Arc<R>,
}

impl<R> TaskService<R> {
    pub fn new(task_repo: Arc<R>) -> Self {
        Self { task_repo }
    }
}

#[async_trait]
impl<R> TaskCommand for TaskService<R>
where
    R: TaskRepository,
{
    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task, Error> {
        let draft = TaskDraft {
            id: Uuid::new_v4(),
            section_id: request.section.section_id,
            settings: request.settings,
            position: request.position,
        };
        self.task_repo
            .create(&request.section.owner, &draft)
            .await
            .map_err(map_repository_error)
    }

    async fn update_task(&self, request: UpdateTaskRequest) -> Result<Task, Error> {
        self.task_repo
            .update(&request.task.owner, request.task.task_id, &request.settings)
            .await
            .map_err(map_repository_error)
    }

    async fn move_task(&self, request: MoveTaskRequest) -> Result<Task, Error> {
        self.task_repo
            .move_to(&request.task.owner, request.task.task_id, request.target)
            .await
            .map_err(map_repository_error)
    }

    async fn delete_task(&self, task: TaskRef) -> Result<(), Error> {
        self.task_repo
            .delete(&task.owner, task.task_id)
            .await
            .map_err(map_repository_error)?;
        info!(task_id = %task.task_id, "task deleted");
        Ok(())
    }
}

#[async_trait]
impl<R> TaskQuery for TaskService<R>
where
    R: TaskRepository,
{
    async fn list_tasks(&self, section: SectionRef) -> Result<Vec<Task>, Error> {
        self.task_repo
            .list(&section.owner, section.section_id)
            .await
            .map_err(map_repository_error)
    }
}

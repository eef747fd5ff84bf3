//! Driving ports for tasks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Error, SiblingOrder, Task, TaskSettings, UserId};

use super::SectionRef;

/// Identifies a task on behalf of its challenge's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub owner: UserId,
    pub task_id: Uuid,
}

/// Request to add a task to a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub section: SectionRef,
    pub settings: TaskSettings,
    /// Appended when absent.
    pub position: Option<SiblingOrder>,
}

/// Request to replace a task's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    pub task: TaskRef,
    pub settings: TaskSettings,
}

/// Request to move a task to a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskRequest {
    pub task: TaskRef,
    pub target: SiblingOrder,
}

/// Driving port for task write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskCommand: Send + Sync {
    async fn create_task(&self, request: CreateTaskRequest) -> Result<Task, Error>;

    async fn update_task(&self, request: UpdateTaskRequest) -> Result<Task, Error>;

    async fn move_task(&self, request: MoveTaskRequest) -> Result<Task, Error>;

    /// Delete a task with its task records, compacting the remaining tasks.
    async fn delete_task(&self, task: TaskRef) -> Result<(), Error>;
}

/// Driving port for task read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskQuery: Send + Sync {
    /// Tasks of a section in display order.
    async fn list_tasks(&self, section: SectionRef) -> Result<Vec<Task>, Error>;
}

//! Port for task persistence.
//!
//! Tasks form an ordered sibling set per section; ownership is resolved
//! through the section's challenge.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{SiblingOrder, Task, TaskDraft, TaskSettings, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by task repository adapters.
    pub enum TaskRepositoryError for "task repository" {
        /// The parent section is missing or not owned by the caller.
        SectionNotFound { section_id: Uuid } =>
            "section {section_id} not found",
        /// The task is missing or not owned by the caller.
        NotFound { task_id: Uuid } =>
            "task {task_id} not found",
    }
}

/// Port for task storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks of an owned section, ascending by order.
    async fn list(&self, owner: &UserId, section_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError>;

    /// Insert a task, appending it or displacing later siblings.
    async fn create(&self, owner: &UserId, draft: &TaskDraft) -> Result<Task, TaskRepositoryError>;

    /// Replace the task's settings. The order is left untouched.
    async fn update(
        &self,
        owner: &UserId,
        task_id: Uuid,
        settings: &TaskSettings,
    ) -> Result<Task, TaskRepositoryError>;

    /// Move the task to `target`, shifting the siblings in between.
    async fn move_to(
        &self,
        owner: &UserId,
        task_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Task, TaskRepositoryError>;

    /// Delete the task with its task records and compact the remaining tasks.
    async fn delete(&self, owner: &UserId, task_id: Uuid) -> Result<(), TaskRepositoryError>;
}

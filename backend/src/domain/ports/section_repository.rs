//! Port for section persistence.
//!
//! Sections form an ordered sibling set per challenge. Adapters keep the
//! orders dense by applying the domain's ordering plans inside the same
//! transaction as the row change.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Section, SectionChanges, SectionDraft, SiblingOrder, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by section repository adapters.
    pub enum SectionRepositoryError for "section repository" {
        /// The parent challenge is missing or not owned by the caller.
        ChallengeNotFound { challenge_id: Uuid } =>
            "challenge {challenge_id} not found",
        /// The section is missing or not owned by the caller.
        NotFound { section_id: Uuid } =>
            "section {section_id} not found",
    }
}

/// Port for section storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionRepository: Send + Sync {
    /// Sections of an owned challenge, ascending by order.
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Section>, SectionRepositoryError>;

    /// Insert a section, appending it or displacing later siblings.
    async fn create(
        &self,
        owner: &UserId,
        draft: &SectionDraft,
    ) -> Result<Section, SectionRepositoryError>;

    /// Replace the section's name and description.
    async fn update(
        &self,
        owner: &UserId,
        section_id: Uuid,
        changes: &SectionChanges,
    ) -> Result<Section, SectionRepositoryError>;

    /// Move the section to `target`, shifting the siblings in between.
    async fn move_to(
        &self,
        owner: &UserId,
        section_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Section, SectionRepositoryError>;

    /// Delete the section with its tasks and compact the remaining sections.
    async fn delete(&self, owner: &UserId, section_id: Uuid) -> Result<(), SectionRepositoryError>;
}

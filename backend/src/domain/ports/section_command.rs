//! Driving ports for sections.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{EntityName, Error, Section, SiblingOrder, UserId};

use super::ChallengeRef;

/// Identifies a section on behalf of its challenge's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef {
    pub owner: UserId,
    pub section_id: Uuid,
}

/// Request to add a section to a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSectionRequest {
    pub owner: UserId,
    pub challenge_id: Uuid,
    pub name: EntityName,
    pub description: String,
    /// Appended when absent.
    pub position: Option<SiblingOrder>,
}

/// Request to rename or re-describe a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSectionRequest {
    pub section: SectionRef,
    pub name: EntityName,
    pub description: String,
}

/// Request to move a section to a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSectionRequest {
    pub section: SectionRef,
    pub target: SiblingOrder,
}

/// Driving port for section write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionCommand: Send + Sync {
    async fn create_section(&self, request: CreateSectionRequest) -> Result<Section, Error>;

    async fn update_section(&self, request: UpdateSectionRequest) -> Result<Section, Error>;

    async fn move_section(&self, request: MoveSectionRequest) -> Result<Section, Error>;

    /// Delete a section with its tasks, compacting the remaining sections.
    async fn delete_section(&self, section: SectionRef) -> Result<(), Error>;
}

/// Driving port for section read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionQuery: Send + Sync {
    /// Sections of a challenge in display order.
    async fn list_sections(&self, challenge: ChallengeRef) -> Result<Vec<Section>, Error>;
}

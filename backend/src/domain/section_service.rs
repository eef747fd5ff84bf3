//! Section domain service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::challenge_service::challenge_not_found;
use crate::domain::ports::{
    ChallengeRef, CreateSectionRequest, MoveSectionRequest, SectionCommand, SectionQuery,
    SectionRef, SectionRepository, SectionRepositoryError, UpdateSectionRequest,
};
use crate::domain::{Error, Section, SectionChanges, SectionDraft};

fn map_repository_error(error: SectionRepositoryError) -> Error {
    match error {
        SectionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("section repository unavailable: {message}"))
        }
        SectionRepositoryError::Query { message } => {
            Error::internal(format!("section repository error: {message}"))
        }
        SectionRepositoryError::ChallengeNotFound { challenge_id } => {
            challenge_not_found(challenge_id)
        }
        SectionRepositoryError::NotFound { section_id } => section_not_found(section_id),
    }
}

pub(crate) fn section_not_found(section_id: Uuid) -> Error {
    Error::not_found(format!("section {section_id} not found"))
}

/// Section service implementing the command and query driving ports.
#[derive(Clone)]
pub struct SectionService<R> {
    section_repo: Arc<R>,
}

impl<R> SectionService<R> {
    pub fn new(section_repo: Arc<R>) -> Self {
        Self { section_repo }
    }
}

#[async_trait]
impl<R> SectionCommand for SectionService<R>
where
    R: SectionRepository,
{
    async fn create_section(&self, request: CreateSectionRequest) -> Result<Section, Error> {
        let draft = SectionDraft {
            id: Uuid::new_v4(),
            challenge_id: request.challenge_id,
            name: request.name,
            description: request.description,
            position: request.position,
        };
        self.section_repo
            .create(&request.owner, &draft)
            .await
            .map_err(map_repository_error)
    }

    async fn update_section(&self, request: UpdateSectionRequest) -> Result<Section, Error> {
        let changes = SectionChanges {
            name: request.name,
            description: request.description,
        };
        self.section_repo
            .update(&request.section.owner, request.section.section_id, &changes)
            .await
            .map_err(map_repository_error)
    }

    async fn move_section(&self, request: MoveSectionRequest) -> Result<Section, Error> {
        self.section_repo
            .move_to(
                &request.section.owner,
                request.section.section_id,
                request.target,
            )
            .await
            .map_err(map_repository_error)
    }

    async fn delete_section(&self, section: SectionRef) -> Result<(), Error> {
        self.section_repo
            .delete(&section.owner, section.section_id)
            .await
            .map_err(map_repository_error)?;
        info!(section_id = %section.section_id, "section deleted");
        Ok(())
    }
}

#[async_trait]
impl<R> SectionQuery for SectionService<R>
where
    R: SectionRepository,
{
    async fn list_sections(&self, challenge: ChallengeRef) -> Result<Vec<Section>, Error> {
        self.section_repo
            .list(&challenge.owner, challenge.challenge_id)
            .await
            .map_err(map_repository_error)
    }
}

//! Sections group a challenge's tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityName, SiblingOrder};

/// Persisted section, ordered among the sections of its challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub name: EntityName,
    pub description: String,
    pub order: SiblingOrder,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDraft {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub name: EntityName,
    pub description: String,
    /// Requested position; appended when absent.
    pub position: Option<SiblingOrder>,
}

/// Editable fields of a section. Order changes go through a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionChanges {
    pub name: EntityName,
    pub description: String,
}

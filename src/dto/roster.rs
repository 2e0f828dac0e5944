//! DTO definitions for the participant, song, and attribution surfaces.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{
    AttributionEntity, AttributionRole, CustomOptionEntity, CustomOptionRole, ParticipantEntity,
    SongEntity,
};
use crate::dto::{format_system_time, validation};

/// Projection of a participant for listing and mutation responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
    pub disruptor_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ParticipantEntity> for ParticipantSummary {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            disruptor_only: entity.disruptor_only,
            contact: entity.contact,
            profile_url: entity.profile_url,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Payload for creating or replacing a participant.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ParticipantInput {
    #[validate(custom(function = "validation::validate_display_name"))]
    pub name: String,
    #[serde(default)]
    pub disruptor_only: bool,
    pub contact: Option<String>,
    pub profile_url: Option<String>,
}

/// Projection of a song for listing and mutation responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongSummary {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub is_bonus: bool,
    pub mystery_order: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SongEntity> for SongSummary {
    fn from(entity: SongEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            artist: entity.artist,
            is_bonus: entity.is_bonus,
            mystery_order: entity.mystery_order,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Payload for creating or replacing a song.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SongInput {
    #[validate(custom(function = "validation::validate_display_name"))]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub is_bonus: bool,
    /// Explicit mystery order; omit to keep the stored value (0 on creation).
    pub mystery_order: Option<u32>,
}

/// Attribution row as exposed to the admin UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttributionView {
    pub song_id: Uuid,
    pub participant_id: Uuid,
    pub role: AttributionRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AttributionEntity> for AttributionView {
    fn from(entity: AttributionEntity) -> Self {
        Self {
            song_id: entity.song_id,
            participant_id: entity.participant_id,
            role: entity.role,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// Query filter for the attribution listing endpoint.
#[derive(Debug, Deserialize, IntoParams)]
pub struct AttributionsQuery {
    /// Narrow the listing to one song.
    pub song_id: Option<Uuid>,
}

/// One curated attribution entry inside a replace request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributionInput {
    pub participant_id: Uuid,
    pub role: AttributionRole,
}

/// Replace the full curated attribution set of one song.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceAttributionsRequest {
    #[validate(custom(function = "validation::validate_curated_attributions"))]
    pub attributions: Vec<AttributionInput>,
}

/// Custom option as exposed to the admin UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomOptionView {
    pub id: Uuid,
    pub song_id: Uuid,
    pub label: String,
    pub role: CustomOptionRole,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CustomOptionEntity> for CustomOptionView {
    fn from(entity: CustomOptionEntity) -> Self {
        Self {
            id: entity.id,
            song_id: entity.song_id,
            label: entity.label,
            role: entity.role,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

/// One custom option entry inside a replace request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomOptionInput {
    pub label: String,
    pub role: CustomOptionRole,
}

/// Replace the full custom option set of one song.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplaceCustomOptionsRequest {
    #[validate(custom(function = "validation::validate_custom_option_labels"))]
    pub options: Vec<CustomOptionInput>,
}

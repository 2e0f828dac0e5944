use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Song registered for the competition quiz.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    /// Stable identifier for the song.
    pub id: Uuid,
    /// Display title of the song.
    pub title: String,
    /// Display name of the song's artist.
    pub artist: String,
    /// Bonus songs are excluded from decoy assignment and the questionnaire.
    pub is_bonus: bool,
    /// Position of the song in the mystery reveal order (0 = unordered).
    pub mystery_order: u32,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the song entity was updated.
    pub updated_at: SystemTime,
}

/// Participant registered with the competition (chart designer or filler).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Stable identifier for the participant.
    pub id: Uuid,
    /// Display name of the participant.
    pub name: String,
    /// Disruptor participants only pad option lists; they are never a correct
    /// answer and never assignable as a decoy.
    pub disruptor_only: bool,
    /// Optional contact handle kept for organizers.
    pub contact: Option<String>,
    /// Optional public profile URL shown in questionnaire options.
    pub profile_url: Option<String>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the participant entity was updated.
    pub updated_at: SystemTime,
}

/// Role of an attribution row linking a participant to a song.
///
/// `Real` and `Fixed` rows are asserted by organizers and read-only to the
/// decoy engine; `Decoy` rows are owned by the engine and fully recomputed on
/// every run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttributionRole {
    /// The participant genuinely designed this song's chart.
    Real,
    /// Manually curated false option.
    Fixed,
    /// Automatically assigned false option.
    Decoy,
}

/// Attribution row keyed by `(song_id, participant_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributionEntity {
    /// Song this attribution belongs to.
    pub song_id: Uuid,
    /// Participant presented as an option for the song.
    pub participant_id: Uuid,
    /// Role of the row (real answer, curated decoy, random decoy).
    pub role: AttributionRole,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the attribution row was updated.
    pub updated_at: SystemTime,
}

impl AttributionEntity {
    /// Compound key identifying this row.
    pub fn key(&self) -> AttributionKey {
        AttributionKey {
            song_id: self.song_id,
            participant_id: self.participant_id,
        }
    }
}

/// Compound key `(song_id, participant_id)` of an attribution row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AttributionKey {
    /// Song half of the key.
    pub song_id: Uuid,
    /// Participant half of the key.
    pub participant_id: Uuid,
}

/// Role of a free-label custom option attached to a song.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomOptionRole {
    /// The label names the genuine designer.
    Real,
    /// The label is a curated false option.
    Fake,
}

/// Free-label option overriding participant-backed options for one song.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomOptionEntity {
    /// Stable identifier for the option.
    pub id: Uuid,
    /// Song this option belongs to.
    pub song_id: Uuid,
    /// Text shown verbatim in the questionnaire.
    pub label: String,
    /// Whether the label is the genuine answer or a curated fake.
    pub role: CustomOptionRole,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the option was updated.
    pub updated_at: SystemTime,
}

//! DTO definitions used by the admin assignment and maintenance endpoints.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::decoy_engine::SongDecoySummary;

/// Per-song outcome of a decoy reassignment run, in processing order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SongDecoySummaryView {
    pub song_id: Uuid,
    /// Human-curated option count found on the song before refilling.
    pub existing: u32,
    /// Decoy rows added by the run.
    pub added: u32,
    /// Total option count after the run.
    #[serde(rename = "final")]
    pub final_options: u32,
}

impl From<SongDecoySummary> for SongDecoySummaryView {
    fn from(summary: SongDecoySummary) -> Self {
        Self {
            song_id: summary.song_id,
            existing: summary.existing,
            added: summary.added,
            final_options: summary.final_options,
        }
    }
}

//! Orchestration of decoy reassignment runs: snapshot read, planning, and the
//! atomic batch apply against the storage backend.

use tracing::{debug, info};

use crate::{
    error::ServiceError,
    services::decoy_engine::{self, RosterSnapshot, SongDecoySummary},
    state::SharedState,
};

/// Recompute the random decoy rows of every non-bonus song.
///
/// The run holds the reassignment gate for its whole duration so concurrent
/// triggers serialize, reads one storage snapshot up front, plans with the
/// process RNG, and applies the resulting batch atomically. Any error leaves
/// storage untouched.
pub async fn reassign_random_decoys(
    state: &SharedState,
) -> Result<Vec<SongDecoySummary>, ServiceError> {
    let _gate = state.reassign_gate().lock().await;
    let store = state.require_roster_store().await?;

    let snapshot = RosterSnapshot {
        songs: store.list_songs().await?,
        participants: store.list_participants().await?,
        attributions: store.list_attributions().await?,
    };

    let min_required = state.config().min_required_options();
    let plan = {
        let mut rng = rand::rng();
        decoy_engine::plan_decoys(&snapshot, min_required, &mut rng)?
    };

    debug!(
        deletes = plan.deletes.len(),
        inserts = plan.inserts.len(),
        "applying decoy reassignment batch"
    );
    let added: u32 = plan.summaries.iter().map(|s| s.added).sum();
    store
        .apply_decoy_reassignment(plan.deletes, plan.inserts)
        .await?;

    for summary in &plan.summaries {
        debug!(
            song_id = %summary.song_id,
            existing = summary.existing,
            added = summary.added,
            final_options = summary.final_options,
            "song options refilled"
        );
    }
    info!(
        songs = plan.summaries.len(),
        added, "random decoy reassignment committed"
    );

    Ok(plan.summaries)
}

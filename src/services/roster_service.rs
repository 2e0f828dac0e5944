//! Business logic powering the roster REST routes: participant and song CRUD,
//! curated attribution editing, custom options, and the mystery order
//! shuffle.

use std::time::SystemTime;

use rand::seq::SliceRandom;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::models::{
        AttributionEntity, AttributionKey, CustomOptionEntity, ParticipantEntity, SongEntity,
    },
    dto::roster::{
        AttributionView, CustomOptionView, ParticipantInput, ParticipantSummary,
        ReplaceAttributionsRequest, ReplaceCustomOptionsRequest, SongInput, SongSummary,
    },
    error::ServiceError,
    state::SharedState,
};

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Return every registered participant.
pub async fn list_participants(state: &SharedState) -> Result<Vec<ParticipantSummary>, ServiceError> {
    let store = state.require_roster_store().await?;
    let participants = store.list_participants().await?;
    Ok(participants.into_iter().map(Into::into).collect())
}

/// Register a new participant.
pub async fn create_participant(
    state: &SharedState,
    input: ParticipantInput,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_roster_store().await?;
    let now = SystemTime::now();
    let participant = ParticipantEntity {
        id: Uuid::new_v4(),
        name: input.name,
        disruptor_only: input.disruptor_only,
        contact: input.contact,
        profile_url: input.profile_url,
        created_at: now,
        updated_at: now,
    };
    store.save_participant(participant.clone()).await?;
    Ok(participant.into())
}

/// Replace an existing participant's editable fields.
pub async fn update_participant(
    state: &SharedState,
    id: Uuid,
    input: ParticipantInput,
) -> Result<ParticipantSummary, ServiceError> {
    let store = state.require_roster_store().await?;
    let mut participant = store
        .list_participants()
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{id}` not found")))?;

    participant.name = input.name;
    participant.disruptor_only = input.disruptor_only;
    participant.contact = input.contact;
    participant.profile_url = input.profile_url;
    participant.updated_at = SystemTime::now();

    store.save_participant(participant.clone()).await?;
    Ok(participant.into())
}

/// Delete a participant; their attribution rows cascade away with them.
pub async fn delete_participant(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_roster_store().await?;
    if store.delete_participant(id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "participant `{id}` not found"
        )))
    }
}

// ---------------------------------------------------------------------------
// Songs
// ---------------------------------------------------------------------------

/// Return every registered song.
pub async fn list_songs(state: &SharedState) -> Result<Vec<SongSummary>, ServiceError> {
    let store = state.require_roster_store().await?;
    let songs = store.list_songs().await?;
    Ok(songs.into_iter().map(Into::into).collect())
}

/// Register a new song.
pub async fn create_song(
    state: &SharedState,
    input: SongInput,
) -> Result<SongSummary, ServiceError> {
    let store = state.require_roster_store().await?;
    let now = SystemTime::now();
    let song = SongEntity {
        id: Uuid::new_v4(),
        title: input.title,
        artist: input.artist,
        is_bonus: input.is_bonus,
        mystery_order: input.mystery_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };
    store.save_song(song.clone()).await?;
    Ok(song.into())
}

/// Replace an existing song's editable fields.
pub async fn update_song(
    state: &SharedState,
    id: Uuid,
    input: SongInput,
) -> Result<SongSummary, ServiceError> {
    let store = state.require_roster_store().await?;
    let mut song = find_song(state, id).await?;

    song.title = input.title;
    song.artist = input.artist;
    song.is_bonus = input.is_bonus;
    if let Some(order) = input.mystery_order {
        song.mystery_order = order;
    }
    song.updated_at = SystemTime::now();

    store.save_song(song.clone()).await?;
    Ok(song.into())
}

/// Delete a song; attribution rows and custom options cascade away with it.
pub async fn delete_song(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_roster_store().await?;
    if store.delete_song(id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("song `{id}` not found")))
    }
}

/// Shuffle every song into a fresh 1..n mystery order.
pub async fn randomize_mystery_order(state: &SharedState) -> Result<Vec<SongSummary>, ServiceError> {
    let store = state.require_roster_store().await?;
    let mut songs = store.list_songs().await?;

    {
        let mut rng = rand::rng();
        songs.shuffle(&mut rng);
    }

    let now = SystemTime::now();
    let mut summaries = Vec::with_capacity(songs.len());
    for (index, mut song) in songs.into_iter().enumerate() {
        song.mystery_order = index as u32 + 1;
        song.updated_at = now;
        store.save_song(song.clone()).await?;
        summaries.push(song.into());
    }

    debug!(songs = summaries.len(), "assigned fresh mystery order");
    Ok(summaries)
}

// ---------------------------------------------------------------------------
// Attributions
// ---------------------------------------------------------------------------

/// List attribution rows, optionally narrowed to one song.
pub async fn list_attributions(
    state: &SharedState,
    song_id: Option<Uuid>,
) -> Result<Vec<AttributionView>, ServiceError> {
    let store = state.require_roster_store().await?;
    let rows = match song_id {
        Some(song_id) => store.list_attributions_for_song(song_id).await?,
        None => store.list_attributions().await?,
    };
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Replace the full attribution set of one song with the submitted curated
/// rows.
///
/// Rows for participants absent from the submission are deleted (including
/// engine-owned decoy rows, which the next reassignment run recreates); rows
/// for participants already present get their role updated in place; the rest
/// are inserted.
pub async fn replace_song_attributions(
    state: &SharedState,
    song_id: Uuid,
    request: ReplaceAttributionsRequest,
) -> Result<Vec<AttributionView>, ServiceError> {
    let store = state.require_roster_store().await?;
    find_song(state, song_id).await?;

    let known: std::collections::HashSet<Uuid> = store
        .list_participants()
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if let Some(unknown) = request
        .attributions
        .iter()
        .find(|entry| !known.contains(&entry.participant_id))
    {
        return Err(ServiceError::NotFound(format!(
            "participant `{}` not found",
            unknown.participant_id
        )));
    }

    let existing = store.list_attributions_for_song(song_id).await?;
    let submitted: std::collections::HashSet<Uuid> = request
        .attributions
        .iter()
        .map(|entry| entry.participant_id)
        .collect();

    for stale in existing
        .iter()
        .filter(|row| !submitted.contains(&row.participant_id))
    {
        store.delete_attribution(stale.key()).await?;
    }

    let now = SystemTime::now();
    for entry in request.attributions {
        let row = match existing
            .iter()
            .find(|row| row.participant_id == entry.participant_id)
        {
            Some(current) => AttributionEntity {
                role: entry.role,
                updated_at: now,
                ..current.clone()
            },
            None => AttributionEntity {
                song_id,
                participant_id: entry.participant_id,
                role: entry.role,
                created_at: now,
                updated_at: now,
            },
        };
        store.save_attribution(row).await?;
    }

    let rows = store.list_attributions_for_song(song_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Delete a single attribution row.
pub async fn delete_attribution(
    state: &SharedState,
    song_id: Uuid,
    participant_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_roster_store().await?;
    let deleted = store
        .delete_attribution(AttributionKey {
            song_id,
            participant_id,
        })
        .await?;
    if deleted {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "no attribution links participant `{participant_id}` to song `{song_id}`"
        )))
    }
}

// ---------------------------------------------------------------------------
// Custom options
// ---------------------------------------------------------------------------

/// List the custom options of one song.
pub async fn list_custom_options(
    state: &SharedState,
    song_id: Uuid,
) -> Result<Vec<CustomOptionView>, ServiceError> {
    let store = state.require_roster_store().await?;
    let options = store.list_custom_options_for_song(song_id).await?;
    Ok(options.into_iter().map(Into::into).collect())
}

/// Replace the full custom option set of one song.
pub async fn replace_custom_options(
    state: &SharedState,
    song_id: Uuid,
    request: ReplaceCustomOptionsRequest,
) -> Result<Vec<CustomOptionView>, ServiceError> {
    let store = state.require_roster_store().await?;
    find_song(state, song_id).await?;

    let now = SystemTime::now();
    let options: Vec<CustomOptionEntity> = request
        .options
        .into_iter()
        .map(|input| CustomOptionEntity {
            id: Uuid::new_v4(),
            song_id,
            label: input.label,
            role: input.role,
            created_at: now,
            updated_at: now,
        })
        .collect();

    store.replace_custom_options(song_id, options.clone()).await?;
    Ok(options.into_iter().map(Into::into).collect())
}

async fn find_song(state: &SharedState, id: Uuid) -> Result<SongEntity, ServiceError> {
    let store = state.require_roster_store().await?;
    store
        .list_songs()
        .await?
        .into_iter()
        .find(|song| song.id == id)
        .ok_or_else(|| ServiceError::NotFound(format!("song `{id}` not found")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::AttributionRole,
            roster_store::{RosterStore, memory::MemoryRosterStore},
        },
        dto::roster::AttributionInput,
        state::AppState,
    };

    async fn fresh_state() -> SharedState {
        let state = AppState::new(AppConfig::with_min_required_options(4));
        let store: Arc<dyn RosterStore> = Arc::new(MemoryRosterStore::new());
        state.install_roster_store(store).await;
        state
    }

    fn participant_input(name: &str) -> ParticipantInput {
        ParticipantInput {
            name: name.into(),
            disruptor_only: false,
            contact: None,
            profile_url: None,
        }
    }

    fn song_input(title: &str) -> SongInput {
        SongInput {
            title: title.into(),
            artist: "artist".into(),
            is_bonus: false,
            mystery_order: None,
        }
    }

    #[tokio::test]
    async fn participant_crud_roundtrip() {
        let state = fresh_state().await;

        let created = create_participant(&state, participant_input("Iris")).await.unwrap();
        let updated = update_participant(
            &state,
            created.id,
            ParticipantInput {
                name: "Iris v2".into(),
                disruptor_only: true,
                contact: Some("@iris".into()),
                profile_url: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Iris v2");
        assert!(updated.disruptor_only);

        delete_participant(&state, created.id).await.unwrap();
        assert!(list_participants(&state).await.unwrap().is_empty());
        assert!(matches!(
            delete_participant(&state, created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn replace_attributions_diffs_the_existing_set() {
        let state = fresh_state().await;
        let song = create_song(&state, song_input("Arcahv")).await.unwrap();
        let keep = create_participant(&state, participant_input("keep")).await.unwrap();
        let drop = create_participant(&state, participant_input("drop")).await.unwrap();
        let add = create_participant(&state, participant_input("add")).await.unwrap();

        replace_song_attributions(
            &state,
            song.id,
            ReplaceAttributionsRequest {
                attributions: vec![
                    AttributionInput {
                        participant_id: keep.id,
                        role: AttributionRole::Fixed,
                    },
                    AttributionInput {
                        participant_id: drop.id,
                        role: AttributionRole::Fixed,
                    },
                ],
            },
        )
        .await
        .unwrap();

        let rows = replace_song_attributions(
            &state,
            song.id,
            ReplaceAttributionsRequest {
                attributions: vec![
                    AttributionInput {
                        participant_id: keep.id,
                        role: AttributionRole::Real,
                    },
                    AttributionInput {
                        participant_id: add.id,
                        role: AttributionRole::Fixed,
                    },
                ],
            },
        )
        .await
        .unwrap();

        assert_eq!(rows.len(), 2);
        let keep_row = rows.iter().find(|r| r.participant_id == keep.id).unwrap();
        assert_eq!(keep_row.role, AttributionRole::Real);
        assert!(rows.iter().any(|r| r.participant_id == add.id));
        assert!(rows.iter().all(|r| r.participant_id != drop.id));
    }

    #[tokio::test]
    async fn replace_attributions_rejects_unknown_participants() {
        let state = fresh_state().await;
        let song = create_song(&state, song_input("Testify")).await.unwrap();

        let result = replace_song_attributions(
            &state,
            song.id,
            ReplaceAttributionsRequest {
                attributions: vec![AttributionInput {
                    participant_id: Uuid::new_v4(),
                    role: AttributionRole::Real,
                }],
            },
        )
        .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn randomize_mystery_order_assigns_a_permutation() {
        let state = fresh_state().await;
        for index in 0..5 {
            create_song(&state, song_input(&format!("song {index}")))
                .await
                .unwrap();
        }

        let summaries = randomize_mystery_order(&state).await.unwrap();

        let mut orders: Vec<u32> = summaries.iter().map(|s| s.mystery_order).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
    }
}

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{AttributionEntity, AttributionKey, CustomOptionEntity, ParticipantEntity, SongEntity},
    roster_store::RosterStore,
    storage::{StorageError, StorageResult},
};

/// Storage backend keeping the whole roster in process memory.
///
/// Used by the test suite and as the fallback backend when the server runs
/// without the `mongo-store` feature. Insertion order is preserved so listing
/// operations are deterministic.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    inner: Arc<RwLock<RosterTables>>,
}

#[derive(Default)]
struct RosterTables {
    songs: IndexMap<Uuid, SongEntity>,
    participants: IndexMap<Uuid, ParticipantEntity>,
    attributions: IndexMap<AttributionKey, AttributionEntity>,
    custom_options: IndexMap<Uuid, CustomOptionEntity>,
}

#[derive(Debug, thiserror::Error)]
#[error("duplicate attribution for song {song_id} and participant {participant_id}")]
struct DuplicateAttribution {
    song_id: Uuid,
    participant_id: Uuid,
}

impl MemoryRosterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn list_songs(&self) -> Vec<SongEntity> {
        self.inner.read().await.songs.values().cloned().collect()
    }

    async fn save_song(&self, song: SongEntity) {
        self.inner.write().await.songs.insert(song.id, song);
    }

    async fn delete_song(&self, id: Uuid) -> bool {
        let mut tables = self.inner.write().await;
        let removed = tables.songs.shift_remove(&id).is_some();
        if removed {
            // Cascade like the foreign keys of the relational layout.
            tables.attributions.retain(|key, _| key.song_id != id);
            tables.custom_options.retain(|_, option| option.song_id != id);
        }
        removed
    }

    async fn list_participants(&self) -> Vec<ParticipantEntity> {
        self.inner
            .read()
            .await
            .participants
            .values()
            .cloned()
            .collect()
    }

    async fn save_participant(&self, participant: ParticipantEntity) {
        self.inner
            .write()
            .await
            .participants
            .insert(participant.id, participant);
    }

    async fn delete_participant(&self, id: Uuid) -> bool {
        let mut tables = self.inner.write().await;
        let removed = tables.participants.shift_remove(&id).is_some();
        if removed {
            tables.attributions.retain(|key, _| key.participant_id != id);
        }
        removed
    }

    async fn list_attributions(&self) -> Vec<AttributionEntity> {
        self.inner
            .read()
            .await
            .attributions
            .values()
            .cloned()
            .collect()
    }

    async fn list_attributions_for_song(&self, song_id: Uuid) -> Vec<AttributionEntity> {
        self.inner
            .read()
            .await
            .attributions
            .values()
            .filter(|row| row.song_id == song_id)
            .cloned()
            .collect()
    }

    async fn save_attribution(&self, attribution: AttributionEntity) {
        self.inner
            .write()
            .await
            .attributions
            .insert(attribution.key(), attribution);
    }

    async fn delete_attribution(&self, key: AttributionKey) -> bool {
        self.inner
            .write()
            .await
            .attributions
            .shift_remove(&key)
            .is_some()
    }

    async fn apply_decoy_reassignment(
        &self,
        deletes: Vec<AttributionKey>,
        inserts: Vec<AttributionEntity>,
    ) -> StorageResult<()> {
        let mut tables = self.inner.write().await;

        // Stage the batch on a copy so a mid-batch violation leaves the
        // committed table untouched.
        let mut staged = tables.attributions.clone();
        for key in &deletes {
            staged.shift_remove(key);
        }
        for row in inserts {
            if staged.contains_key(&row.key()) {
                return Err(StorageError::unavailable(
                    "decoy batch violates the one-row-per-pair invariant".into(),
                    DuplicateAttribution {
                        song_id: row.song_id,
                        participant_id: row.participant_id,
                    },
                ));
            }
            staged.insert(row.key(), row);
        }

        tables.attributions = staged;
        Ok(())
    }

    async fn list_custom_options(&self) -> Vec<CustomOptionEntity> {
        self.inner
            .read()
            .await
            .custom_options
            .values()
            .cloned()
            .collect()
    }

    async fn list_custom_options_for_song(&self, song_id: Uuid) -> Vec<CustomOptionEntity> {
        self.inner
            .read()
            .await
            .custom_options
            .values()
            .filter(|option| option.song_id == song_id)
            .cloned()
            .collect()
    }

    async fn replace_custom_options(&self, song_id: Uuid, options: Vec<CustomOptionEntity>) {
        let mut tables = self.inner.write().await;
        tables.custom_options.retain(|_, option| option.song_id != song_id);
        for option in options {
            tables.custom_options.insert(option.id, option);
        }
    }
}

impl RosterStore for MemoryRosterStore {
    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_songs().await) })
    }

    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.save_song(song).await;
            Ok(())
        })
    }

    fn delete_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_song(id).await) })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_participants().await) })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.save_participant(participant).await;
            Ok(())
        })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_participant(id).await) })
    }

    fn list_attributions(&self) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_attributions().await) })
    }

    fn list_attributions_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_attributions_for_song(song_id).await) })
    }

    fn save_attribution(
        &self,
        attribution: AttributionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.save_attribution(attribution).await;
            Ok(())
        })
    }

    fn delete_attribution(&self, key: AttributionKey) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_attribution(key).await) })
    }

    fn apply_decoy_reassignment(
        &self,
        deletes: Vec<AttributionKey>,
        inserts: Vec<AttributionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.apply_decoy_reassignment(deletes, inserts).await })
    }

    fn list_custom_options(&self) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_custom_options().await) })
    }

    fn list_custom_options_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_custom_options_for_song(song_id).await) })
    }

    fn replace_custom_options(
        &self,
        song_id: Uuid,
        options: Vec<CustomOptionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.replace_custom_options(song_id, options).await;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::AttributionRole;

    fn song(id: Uuid) -> SongEntity {
        SongEntity {
            id,
            title: "song".into(),
            artist: "artist".into(),
            is_bonus: false,
            mystery_order: 0,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn participant(id: Uuid) -> ParticipantEntity {
        ParticipantEntity {
            id,
            name: "participant".into(),
            disruptor_only: false,
            contact: None,
            profile_url: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn attribution(song_id: Uuid, participant_id: Uuid, role: AttributionRole) -> AttributionEntity {
        AttributionEntity {
            song_id,
            participant_id,
            role,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn save_attribution_upserts_by_key() {
        let store = MemoryRosterStore::new();
        let (song_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .save_attribution(attribution(song_id, user_id, AttributionRole::Fixed))
            .await;
        store
            .save_attribution(attribution(song_id, user_id, AttributionRole::Real))
            .await;

        let rows = store.list_attributions().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, AttributionRole::Real);
    }

    #[tokio::test]
    async fn delete_song_cascades_attributions_and_custom_options() {
        let store = MemoryRosterStore::new();
        let song_id = Uuid::new_v4();
        let other_song = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        store.save_song(song(song_id)).await;
        store.save_song(song(other_song)).await;
        store
            .save_attribution(attribution(song_id, user_id, AttributionRole::Real))
            .await;
        store
            .save_attribution(attribution(other_song, user_id, AttributionRole::Real))
            .await;

        assert!(store.delete_song(song_id).await);
        let rows = store.list_attributions().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].song_id, other_song);
    }

    #[tokio::test]
    async fn delete_participant_cascades_attributions() {
        let store = MemoryRosterStore::new();
        let song_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        store.save_participant(participant(user_id)).await;
        store
            .save_attribution(attribution(song_id, user_id, AttributionRole::Decoy))
            .await;

        assert!(store.delete_participant(user_id).await);
        assert!(store.list_attributions().await.is_empty());
    }

    #[tokio::test]
    async fn decoy_batch_is_all_or_nothing() {
        let store = MemoryRosterStore::new();
        let song_id = Uuid::new_v4();
        let kept = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store
            .save_attribution(attribution(song_id, kept, AttributionRole::Fixed))
            .await;

        // Second insert collides with the fixed row that is not deleted.
        let result = store
            .apply_decoy_reassignment(
                vec![],
                vec![
                    attribution(song_id, fresh, AttributionRole::Decoy),
                    attribution(song_id, kept, AttributionRole::Decoy),
                ],
            )
            .await;

        assert!(result.is_err());
        let rows = store.list_attributions().await;
        assert_eq!(rows.len(), 1, "failed batch must not leave partial writes");
        assert_eq!(rows[0].participant_id, kept);
        assert_eq!(rows[0].role, AttributionRole::Fixed);
    }

    #[tokio::test]
    async fn decoy_batch_deletes_then_inserts() {
        let store = MemoryRosterStore::new();
        let song_id = Uuid::new_v4();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store
            .save_attribution(attribution(song_id, stale, AttributionRole::Decoy))
            .await;

        store
            .apply_decoy_reassignment(
                vec![AttributionKey {
                    song_id,
                    participant_id: stale,
                }],
                vec![attribution(song_id, fresh, AttributionRole::Decoy)],
            )
            .await
            .unwrap();

        let rows = store.list_attributions().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant_id, fresh);
    }

    #[tokio::test]
    async fn replace_custom_options_clears_previous_set() {
        let store = MemoryRosterStore::new();
        let song_id = Uuid::new_v4();
        let make = |label: &str| CustomOptionEntity {
            id: Uuid::new_v4(),
            song_id,
            label: label.into(),
            role: crate::dao::models::CustomOptionRole::Fake,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        };

        store
            .replace_custom_options(song_id, vec![make("old a"), make("old b")])
            .await;
        store.replace_custom_options(song_id, vec![make("new")]).await;

        let options = store.list_custom_options_for_song(song_id).await;
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "new");
    }
}

/// In-memory backend used by tests and as the storage fallback in dev setups.
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    AttributionEntity, AttributionKey, CustomOptionEntity, ParticipantEntity, SongEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for songs, participants,
/// attribution rows, and custom options.
///
/// All write operations are upserts keyed by the entity identity;
/// [`RosterStore::apply_decoy_reassignment`] is the single atomic entry point
/// used by the decoy engine, so a reader never observes a song with its decoy
/// rows removed but not yet replaced.
pub trait RosterStore: Send + Sync {
    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>>;
    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn list_attributions(&self) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>>;
    fn list_attributions_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>>;
    fn save_attribution(
        &self,
        attribution: AttributionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_attribution(&self, key: AttributionKey) -> BoxFuture<'static, StorageResult<bool>>;

    /// Atomically delete the given attribution keys and insert the given rows.
    ///
    /// Either the whole batch commits or none of it does.
    fn apply_decoy_reassignment(
        &self,
        deletes: Vec<AttributionKey>,
        inserts: Vec<AttributionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn list_custom_options(&self) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>>;
    fn list_custom_options_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>>;
    /// Replace the full custom-option set of one song.
    fn replace_custom_options(
        &self,
        song_id: Uuid,
        options: Vec<CustomOptionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

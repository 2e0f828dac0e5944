use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoAttributionDocument, MongoCustomOptionDocument, MongoParticipantDocument,
        MongoSongDocument, attribution_filter, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    models::{AttributionEntity, AttributionKey, CustomOptionEntity, ParticipantEntity, SongEntity},
    roster_store::RosterStore,
    storage::StorageResult,
};

const SONG_COLLECTION_NAME: &str = "songs";
const PARTICIPANT_COLLECTION_NAME: &str = "participants";
const ATTRIBUTION_COLLECTION_NAME: &str = "attributions";
const CUSTOM_OPTION_COLLECTION_NAME: &str = "custom_options";

/// MongoDB-backed [`RosterStore`].
#[derive(Clone)]
pub struct MongoRosterStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRosterStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // One attribution row per (song, participant) pair.
        let attribution_index = mongodb::IndexModel::builder()
            .keys(doc! {"song_id": 1, "participant_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("attribution_pair_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        self.attribution_collection()
            .await
            .create_index(attribution_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ATTRIBUTION_COLLECTION_NAME,
                index: "song_id,participant_id",
                source,
            })?;

        let custom_option_index = mongodb::IndexModel::builder()
            .keys(doc! {"song_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("custom_option_song_idx".to_owned()))
                    .build(),
            )
            .build();
        self.custom_option_collection()
            .await
            .create_index(custom_option_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: CUSTOM_OPTION_COLLECTION_NAME,
                index: "song_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn song_collection(&self) -> Collection<MongoSongDocument> {
        self.database()
            .await
            .collection::<MongoSongDocument>(SONG_COLLECTION_NAME)
    }

    async fn participant_collection(&self) -> Collection<MongoParticipantDocument> {
        self.database()
            .await
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME)
    }

    async fn attribution_collection(&self) -> Collection<MongoAttributionDocument> {
        self.database()
            .await
            .collection::<MongoAttributionDocument>(ATTRIBUTION_COLLECTION_NAME)
    }

    async fn custom_option_collection(&self) -> Collection<MongoCustomOptionDocument> {
        self.database()
            .await
            .collection::<MongoCustomOptionDocument>(CUSTOM_OPTION_COLLECTION_NAME)
    }

    async fn list_songs(&self) -> MongoResult<Vec<SongEntity>> {
        let documents: Vec<MongoSongDocument> = self
            .song_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListSongs { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSongs { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_song(&self, song: SongEntity) -> MongoResult<()> {
        let id = song.id;
        let document: MongoSongDocument = song.into();
        self.song_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSong { id, source })?;

        Ok(())
    }

    async fn delete_song(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .song_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteSong { id, source })?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        // Cascade like the foreign keys of the relational layout.
        self.attribution_collection()
            .await
            .delete_many(doc! { "song_id": uuid_as_binary(id) })
            .await
            .map_err(|source| MongoDaoError::DeleteSong { id, source })?;
        self.custom_option_collection()
            .await
            .delete_many(doc! { "song_id": uuid_as_binary(id) })
            .await
            .map_err(|source| MongoDaoError::DeleteSong { id, source })?;

        Ok(true)
    }

    async fn list_participants(&self) -> MongoResult<Vec<ParticipantEntity>> {
        let documents: Vec<MongoParticipantDocument> = self
            .participant_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListParticipants { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListParticipants { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_participant(&self, participant: ParticipantEntity) -> MongoResult<()> {
        let id = participant.id;
        let document: MongoParticipantDocument = participant.into();
        self.participant_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveParticipant { id, source })?;

        Ok(())
    }

    async fn delete_participant(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .participant_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteParticipant { id, source })?;

        if result.deleted_count == 0 {
            return Ok(false);
        }

        self.attribution_collection()
            .await
            .delete_many(doc! { "participant_id": uuid_as_binary(id) })
            .await
            .map_err(|source| MongoDaoError::DeleteParticipant { id, source })?;

        Ok(true)
    }

    async fn list_attributions(&self) -> MongoResult<Vec<AttributionEntity>> {
        let documents: Vec<MongoAttributionDocument> = self
            .attribution_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListAttributions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListAttributions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_attributions_for_song(&self, song_id: Uuid) -> MongoResult<Vec<AttributionEntity>> {
        let documents: Vec<MongoAttributionDocument> = self
            .attribution_collection()
            .await
            .find(doc! { "song_id": uuid_as_binary(song_id) })
            .await
            .map_err(|source| MongoDaoError::ListAttributions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListAttributions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_attribution(&self, attribution: AttributionEntity) -> MongoResult<()> {
        let key = attribution.key();
        let document: MongoAttributionDocument = attribution.into();
        self.attribution_collection()
            .await
            .replace_one(attribution_filter(&key), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveAttribution {
                song_id: key.song_id,
                participant_id: key.participant_id,
                source,
            })?;

        Ok(())
    }

    async fn delete_attribution(&self, key: AttributionKey) -> MongoResult<bool> {
        let result = self
            .attribution_collection()
            .await
            .delete_one(attribution_filter(&key))
            .await
            .map_err(|source| MongoDaoError::DeleteAttribution {
                song_id: key.song_id,
                participant_id: key.participant_id,
                source,
            })?;

        Ok(result.deleted_count > 0)
    }

    /// Apply the decoy batch inside one multi-document transaction so readers
    /// never observe a song with its decoys cleared but not yet refilled.
    async fn apply_decoy_reassignment(
        &self,
        deletes: Vec<AttributionKey>,
        inserts: Vec<AttributionEntity>,
    ) -> MongoResult<()> {
        let client = self.client().await;
        let collection = self.attribution_collection().await;

        let mut session = client
            .start_session()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;
        session
            .start_transaction()
            .await
            .map_err(|source| MongoDaoError::Transaction { source })?;

        let outcome: Result<(), mongodb::error::Error> = async {
            for key in &deletes {
                collection
                    .delete_one(attribution_filter(key))
                    .session(&mut session)
                    .await?;
            }

            if !inserts.is_empty() {
                let documents: Vec<MongoAttributionDocument> =
                    inserts.into_iter().map(Into::into).collect();
                collection
                    .insert_many(documents)
                    .session(&mut session)
                    .await?;
            }

            Ok(())
        }
        .await;

        match outcome {
            Ok(()) => session
                .commit_transaction()
                .await
                .map_err(|source| MongoDaoError::Transaction { source }),
            Err(source) => {
                let _ = session.abort_transaction().await;
                Err(MongoDaoError::Transaction { source })
            }
        }
    }

    async fn list_custom_options(&self) -> MongoResult<Vec<CustomOptionEntity>> {
        let documents: Vec<MongoCustomOptionDocument> = self
            .custom_option_collection()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListCustomOptions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCustomOptions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_custom_options_for_song(
        &self,
        song_id: Uuid,
    ) -> MongoResult<Vec<CustomOptionEntity>> {
        let documents: Vec<MongoCustomOptionDocument> = self
            .custom_option_collection()
            .await
            .find(doc! { "song_id": uuid_as_binary(song_id) })
            .await
            .map_err(|source| MongoDaoError::ListCustomOptions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCustomOptions { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn replace_custom_options(
        &self,
        song_id: Uuid,
        options: Vec<CustomOptionEntity>,
    ) -> MongoResult<()> {
        let collection = self.custom_option_collection().await;

        collection
            .delete_many(doc! { "song_id": uuid_as_binary(song_id) })
            .await
            .map_err(|source| MongoDaoError::ReplaceCustomOptions { song_id, source })?;

        if !options.is_empty() {
            let documents: Vec<MongoCustomOptionDocument> =
                options.into_iter().map(Into::into).collect();
            collection
                .insert_many(documents)
                .await
                .map_err(|source| MongoDaoError::ReplaceCustomOptions { song_id, source })?;
        }

        Ok(())
    }
}

impl RosterStore for MongoRosterStore {
    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_songs().await.map_err(Into::into) })
    }

    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_song(song).await.map_err(Into::into) })
    }

    fn delete_song(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_song(id).await.map_err(Into::into) })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants().await.map_err(Into::into) })
    }

    fn save_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_participant(participant).await.map_err(Into::into) })
    }

    fn delete_participant(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_participant(id).await.map_err(Into::into) })
    }

    fn list_attributions(&self) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_attributions().await.map_err(Into::into) })
    }

    fn list_attributions_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AttributionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_attributions_for_song(song_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_attribution(
        &self,
        attribution: AttributionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_attribution(attribution).await.map_err(Into::into) })
    }

    fn delete_attribution(&self, key: AttributionKey) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_attribution(key).await.map_err(Into::into) })
    }

    fn apply_decoy_reassignment(
        &self,
        deletes: Vec<AttributionKey>,
        inserts: Vec<AttributionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .apply_decoy_reassignment(deletes, inserts)
                .await
                .map_err(Into::into)
        })
    }

    fn list_custom_options(&self) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_custom_options().await.map_err(Into::into) })
    }

    fn list_custom_options_for_song(
        &self,
        song_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<CustomOptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_custom_options_for_song(song_id)
                .await
                .map_err(Into::into)
        })
    }

    fn replace_custom_options(
        &self,
        song_id: Uuid,
        options: Vec<CustomOptionEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .replace_custom_options(song_id, options)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

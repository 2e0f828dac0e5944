use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures surfaced by the MongoDB roster backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save song `{id}`")]
    SaveSong {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete song `{id}`")]
    DeleteSong {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list songs")]
    ListSongs {
        #[source]
        source: MongoError,
    },
    #[error("failed to save participant `{id}`")]
    SaveParticipant {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete participant `{id}`")]
    DeleteParticipant {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list participants")]
    ListParticipants {
        #[source]
        source: MongoError,
    },
    #[error("failed to save attribution for song `{song_id}` and participant `{participant_id}`")]
    SaveAttribution {
        song_id: Uuid,
        participant_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete attribution for song `{song_id}` and participant `{participant_id}`")]
    DeleteAttribution {
        song_id: Uuid,
        participant_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list attributions")]
    ListAttributions {
        #[source]
        source: MongoError,
    },
    #[error("decoy reassignment transaction failed")]
    Transaction {
        #[source]
        source: MongoError,
    },
    #[error("failed to replace custom options of song `{song_id}`")]
    ReplaceCustomOptions {
        song_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list custom options")]
    ListCustomOptions {
        #[source]
        source: MongoError,
    },
}

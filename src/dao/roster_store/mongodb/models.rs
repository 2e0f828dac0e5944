use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    AttributionEntity, AttributionKey, AttributionRole, CustomOptionEntity, CustomOptionRole,
    ParticipantEntity, SongEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSongDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    title: String,
    artist: String,
    #[serde(default)]
    is_bonus: bool,
    #[serde(default)]
    mystery_order: u32,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<SongEntity> for MongoSongDocument {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            is_bonus: value.is_bonus,
            mystery_order: value.mystery_order,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoSongDocument> for SongEntity {
    fn from(value: MongoSongDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            artist: value.artist,
            is_bonus: value.is_bonus,
            mystery_order: value.mystery_order,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    #[serde(default)]
    disruptor_only: bool,
    contact: Option<String>,
    profile_url: Option<String>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            disruptor_only: value.disruptor_only,
            contact: value.contact,
            profile_url: value.profile_url,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            disruptor_only: value.disruptor_only,
            contact: value.contact,
            profile_url: value.profile_url,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAttributionDocument {
    pub song_id: Uuid,
    pub participant_id: Uuid,
    role: AttributionRole,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<AttributionEntity> for MongoAttributionDocument {
    fn from(value: AttributionEntity) -> Self {
        Self {
            song_id: value.song_id,
            participant_id: value.participant_id,
            role: value.role,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoAttributionDocument> for AttributionEntity {
    fn from(value: MongoAttributionDocument) -> Self {
        Self {
            song_id: value.song_id,
            participant_id: value.participant_id,
            role: value.role,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCustomOptionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    pub song_id: Uuid,
    label: String,
    role: CustomOptionRole,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<CustomOptionEntity> for MongoCustomOptionDocument {
    fn from(value: CustomOptionEntity) -> Self {
        Self {
            id: value.id,
            song_id: value.song_id,
            label: value.label,
            role: value.role,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoCustomOptionDocument> for CustomOptionEntity {
    fn from(value: MongoCustomOptionDocument) -> Self {
        Self {
            id: value.id,
            song_id: value.song_id,
            label: value.label,
            role: value.role,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}

pub fn attribution_filter(key: &AttributionKey) -> Document {
    doc! {
        "song_id": uuid_as_binary(key.song_id),
        "participant_id": uuid_as_binary(key.participant_id),
    }
}

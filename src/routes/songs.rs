use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::roster::{SongInput, SongSummary},
    error::AppError,
    services::roster_service,
    state::SharedState,
};

/// Song management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/songs", get(list_songs).post(create_song))
        .route("/admin/songs/{id}", put(update_song).delete(delete_song))
        .route("/admin/songs/order/randomize", post(randomize_mystery_order))
}

/// Retrieve every registered song.
#[utoipa::path(
    get,
    path = "/admin/songs",
    tag = "songs",
    responses((status = 200, description = "List registered songs", body = [SongSummary]))
)]
pub async fn list_songs(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SongSummary>>, AppError> {
    Ok(Json(roster_service::list_songs(&state).await?))
}

/// Register a new song.
#[utoipa::path(
    post,
    path = "/admin/songs",
    tag = "songs",
    request_body = SongInput,
    responses((status = 200, description = "Song created", body = SongSummary))
)]
pub async fn create_song(
    State(state): State<SharedState>,
    Json(payload): Json<SongInput>,
) -> Result<Json<SongSummary>, AppError> {
    payload.validate()?;
    Ok(Json(roster_service::create_song(&state, payload).await?))
}

/// Replace an existing song's editable fields.
#[utoipa::path(
    put,
    path = "/admin/songs/{id}",
    tag = "songs",
    params(("id" = String, Path, description = "Identifier of the song to update")),
    request_body = SongInput,
    responses((status = 200, description = "Song updated", body = SongSummary))
)]
pub async fn update_song(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SongInput>,
) -> Result<Json<SongSummary>, AppError> {
    payload.validate()?;
    Ok(Json(roster_service::update_song(&state, id, payload).await?))
}

/// Delete a song together with its attribution rows and custom options.
#[utoipa::path(
    delete,
    path = "/admin/songs/{id}",
    tag = "songs",
    params(("id" = String, Path, description = "Identifier of the song to delete")),
    responses((status = 204, description = "Song deleted"))
)]
pub async fn delete_song(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    roster_service::delete_song(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Shuffle every song into a fresh mystery reveal order.
#[utoipa::path(
    post,
    path = "/admin/songs/order/randomize",
    tag = "songs",
    responses((status = 200, description = "Mystery order reassigned", body = [SongSummary]))
)]
pub async fn randomize_mystery_order(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SongSummary>>, AppError> {
    Ok(Json(roster_service::randomize_mystery_order(&state).await?))
}

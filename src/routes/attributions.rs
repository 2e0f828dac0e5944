use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::SongDecoySummaryView,
        roster::{
            AttributionView, AttributionsQuery, CustomOptionView, ReplaceAttributionsRequest,
            ReplaceCustomOptionsRequest,
        },
    },
    error::AppError,
    services::{decoy_service, roster_service},
    state::SharedState,
};

/// Attribution and custom option management endpoints, including the random
/// decoy reassignment trigger.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/attributions", get(list_attributions))
        .route("/admin/attributions/randomize", post(reassign_random_decoys))
        .route(
            "/admin/songs/{id}/attributions",
            put(replace_song_attributions),
        )
        .route(
            "/admin/songs/{id}/attributions/{participant_id}",
            axum::routing::delete(delete_attribution),
        )
        .route(
            "/admin/songs/{id}/custom-options",
            get(list_custom_options).put(replace_custom_options),
        )
}

/// Retrieve attribution rows, optionally narrowed to one song.
#[utoipa::path(
    get,
    path = "/admin/attributions",
    tag = "attributions",
    params(AttributionsQuery),
    responses((status = 200, description = "List attribution rows", body = [AttributionView]))
)]
pub async fn list_attributions(
    State(state): State<SharedState>,
    Query(query): Query<AttributionsQuery>,
) -> Result<Json<Vec<AttributionView>>, AppError> {
    Ok(Json(
        roster_service::list_attributions(&state, query.song_id).await?,
    ))
}

/// Recompute the random decoy rows of every non-bonus song.
#[utoipa::path(
    post,
    path = "/admin/attributions/randomize",
    tag = "attributions",
    responses((status = 200, description = "Per-song reassignment summaries", body = [SongDecoySummaryView]))
)]
pub async fn reassign_random_decoys(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SongDecoySummaryView>>, AppError> {
    let summaries = decoy_service::reassign_random_decoys(&state).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// Replace the curated attribution set of one song.
#[utoipa::path(
    put,
    path = "/admin/songs/{id}/attributions",
    tag = "attributions",
    params(("id" = String, Path, description = "Identifier of the song to edit")),
    request_body = ReplaceAttributionsRequest,
    responses((status = 200, description = "Resulting attribution rows", body = [AttributionView]))
)]
pub async fn replace_song_attributions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceAttributionsRequest>,
) -> Result<Json<Vec<AttributionView>>, AppError> {
    payload.validate()?;
    Ok(Json(
        roster_service::replace_song_attributions(&state, id, payload).await?,
    ))
}

/// Delete a single attribution row.
#[utoipa::path(
    delete,
    path = "/admin/songs/{id}/attributions/{participant_id}",
    tag = "attributions",
    params(
        ("id" = String, Path, description = "Identifier of the song"),
        ("participant_id" = String, Path, description = "Identifier of the participant")
    ),
    responses((status = 204, description = "Attribution deleted"))
)]
pub async fn delete_attribution(
    State(state): State<SharedState>,
    Path((id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    roster_service::delete_attribution(&state, id, participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Retrieve the custom options of one song.
#[utoipa::path(
    get,
    path = "/admin/songs/{id}/custom-options",
    tag = "attributions",
    params(("id" = String, Path, description = "Identifier of the song")),
    responses((status = 200, description = "List custom options", body = [CustomOptionView]))
)]
pub async fn list_custom_options(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CustomOptionView>>, AppError> {
    Ok(Json(roster_service::list_custom_options(&state, id).await?))
}

/// Replace the custom option set of one song.
#[utoipa::path(
    put,
    path = "/admin/songs/{id}/custom-options",
    tag = "attributions",
    params(("id" = String, Path, description = "Identifier of the song")),
    request_body = ReplaceCustomOptionsRequest,
    responses((status = 200, description = "Resulting custom options", body = [CustomOptionView]))
)]
pub async fn replace_custom_options(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceCustomOptionsRequest>,
) -> Result<Json<Vec<CustomOptionView>>, AppError> {
    payload.validate()?;
    Ok(Json(
        roster_service::replace_custom_options(&state, id, payload).await?,
    ))
}

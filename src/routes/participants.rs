use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::roster::{ParticipantInput, ParticipantSummary},
    error::AppError,
    services::roster_service,
    state::SharedState,
};

/// Participant management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/admin/participants",
            get(list_participants).post(create_participant),
        )
        .route(
            "/admin/participants/{id}",
            put(update_participant).delete(delete_participant),
        )
}

/// Retrieve every registered participant.
#[utoipa::path(
    get,
    path = "/admin/participants",
    tag = "participants",
    responses((status = 200, description = "List registered participants", body = [ParticipantSummary]))
)]
pub async fn list_participants(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ParticipantSummary>>, AppError> {
    Ok(Json(roster_service::list_participants(&state).await?))
}

/// Register a new participant.
#[utoipa::path(
    post,
    path = "/admin/participants",
    tag = "participants",
    request_body = ParticipantInput,
    responses((status = 200, description = "Participant created", body = ParticipantSummary))
)]
pub async fn create_participant(
    State(state): State<SharedState>,
    Json(payload): Json<ParticipantInput>,
) -> Result<Json<ParticipantSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        roster_service::create_participant(&state, payload).await?,
    ))
}

/// Replace an existing participant's editable fields.
#[utoipa::path(
    put,
    path = "/admin/participants/{id}",
    tag = "participants",
    params(("id" = String, Path, description = "Identifier of the participant to update")),
    request_body = ParticipantInput,
    responses((status = 200, description = "Participant updated", body = ParticipantSummary))
)]
pub async fn update_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ParticipantInput>,
) -> Result<Json<ParticipantSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        roster_service::update_participant(&state, id, payload).await?,
    ))
}

/// Delete a participant and their attribution rows.
#[utoipa::path(
    delete,
    path = "/admin/participants/{id}",
    tag = "participants",
    params(("id" = String, Path, description = "Identifier of the participant to delete")),
    responses((status = 204, description = "Participant deleted"))
)]
pub async fn delete_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    roster_service::delete_participant(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

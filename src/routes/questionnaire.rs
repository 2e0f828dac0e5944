use axum::{Router, extract::State, routing::get};

use crate::{error::AppError, services::questionnaire_service, state::SharedState};

/// Questionnaire export endpoint.
pub fn router() -> Router<SharedState> {
    Router::new().route("/admin/questionnaire", get(render_questionnaire))
}

/// Render the quiz questionnaire as plain text.
#[utoipa::path(
    get,
    path = "/admin/questionnaire",
    tag = "questionnaire",
    responses((status = 200, description = "Rendered questionnaire", body = String, content_type = "text/plain"))
)]
pub async fn render_questionnaire(
    State(state): State<SharedState>,
) -> Result<String, AppError> {
    Ok(questionnaire_service::render_questionnaire(&state).await?)
}

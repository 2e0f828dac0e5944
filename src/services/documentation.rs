use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Chart Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::participants::list_participants,
        crate::routes::participants::create_participant,
        crate::routes::participants::update_participant,
        crate::routes::participants::delete_participant,
        crate::routes::songs::list_songs,
        crate::routes::songs::create_song,
        crate::routes::songs::update_song,
        crate::routes::songs::delete_song,
        crate::routes::songs::randomize_mystery_order,
        crate::routes::attributions::list_attributions,
        crate::routes::attributions::reassign_random_decoys,
        crate::routes::attributions::replace_song_attributions,
        crate::routes::attributions::delete_attribution,
        crate::routes::attributions::list_custom_options,
        crate::routes::attributions::replace_custom_options,
        crate::routes::questionnaire::render_questionnaire,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::admin::SongDecoySummaryView,
            crate::dto::roster::ParticipantSummary,
            crate::dto::roster::ParticipantInput,
            crate::dto::roster::SongSummary,
            crate::dto::roster::SongInput,
            crate::dto::roster::AttributionView,
            crate::dto::roster::AttributionInput,
            crate::dto::roster::ReplaceAttributionsRequest,
            crate::dto::roster::CustomOptionView,
            crate::dto::roster::CustomOptionInput,
            crate::dto::roster::ReplaceCustomOptionsRequest,
            crate::dao::models::AttributionRole,
            crate::dao::models::CustomOptionRole,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "participants", description = "Participant management"),
        (name = "songs", description = "Song management"),
        (name = "attributions", description = "Attribution curation and random decoy assignment"),
        (name = "questionnaire", description = "Questionnaire export"),
    )
)]
pub struct ApiDoc;

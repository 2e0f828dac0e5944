/// Fair random decoy assignment planning (the pure core).
pub mod decoy_engine;
/// Decoy reassignment orchestration against storage.
pub mod decoy_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Questionnaire text rendering.
pub mod questionnaire_service;
/// Participant, song, attribution, and custom option management.
pub mod roster_service;

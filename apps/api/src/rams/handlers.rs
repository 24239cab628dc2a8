//! Axum route handler for RAMS generation.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::errors::AppError;
use crate::rams::fallback::{select_outcome, GenerateOutcome};
use crate::rams::generator::generate_rams;
use crate::rams::models::GenerationRequest;
use crate::state::AppState;

/// POST /api/v1/generate
///
/// Returns the generated RAMS section, or `{error, fallback: true, boilerplate}` when
/// generation fails for any reason. Both are HTTP 200; only invalid input is a 4xx.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateOutcome>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let job = request.validate()?;

    let result = generate_rams(&state.llm, &job, state.config.generation_timeout).await;

    Ok(Json(select_outcome(result, &job)))
}

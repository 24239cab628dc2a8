//! Axum route handler for toolbox-talk generation.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;

use crate::errors::AppError;
use crate::state::AppState;
use crate::toolbox::generator::generate_toolbox_talk;
use crate::toolbox::models::{ToolboxTalkRequest, ToolboxTalkResult};

/// POST /api/v1/toolbox-talk
///
/// Generation failures surface as 500 `{error: {code, message}}`.
pub async fn handle_toolbox_talk(
    State(state): State<AppState>,
    payload: Result<Json<ToolboxTalkRequest>, JsonRejection>,
) -> Result<Json<ToolboxTalkResult>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let talk = request.validate(Utc::now().date_naive())?;

    let result =
        generate_toolbox_talk(&state.llm, &talk, state.config.generation_timeout).await?;

    Ok(Json(result))
}

//! Toolbox-talk generation. Unlike RAMS there is no boilerplate path: failures are
//! reported to the caller.

use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::{with_deadline, GenerationError, LlmClient};
use crate::toolbox::models::{ToolboxTalk, ToolboxTalkResult};
use crate::toolbox::prompts::{build_toolbox_prompt, system_prompt};

pub async fn generate_toolbox_talk(
    llm: &LlmClient,
    talk: &ToolboxTalk,
    deadline: Duration,
) -> Result<ToolboxTalkResult, GenerationError> {
    let generation_id = Uuid::new_v4();
    let span = info_span!("toolbox_generation", %generation_id, topic = %talk.topic);

    async move {
        let prompt = build_toolbox_prompt(talk);
        let system = system_prompt();

        let generation = llm.call_json::<ToolboxTalkResult>(&prompt, &system);
        let mut result = match with_deadline(deadline, generation).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Toolbox talk generation failed ({}): {e}", e.kind());
                return Err(e);
            }
        };

        result.apply_request_header(talk);
        info!(
            "Toolbox talk generated: {} hazards, {} control measures",
            result.hazards.len(),
            result.control_measures.len()
        );
        Ok(result)
    }
    .instrument(span)
    .await
}

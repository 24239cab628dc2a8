//! RAMS generation: prompt → LLM → normalised payload → content contract check.
//!
//! The model is told to echo the site address in step 5.1 and the client name in
//! step 5.4. Output that ignores this is regenerated once; a second miss is reported
//! as `GenerationError::Contract` and the caller falls back to boilerplate.

use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::{with_deadline, GenerationError, LlmClient};
use crate::rams::models::{GenerationResult, RamsJob, METHOD_STEP_COUNT};
use crate::rams::prompts::{build_rams_prompt, system_prompt};

/// Regenerations allowed when the model breaks the content contract.
const MAX_CONTRACT_RETRIES: u32 = 1;

/// Generates the method statement and COSHH section for one job.
/// The whole attempt, regeneration included, is bounded by `deadline`.
pub async fn generate_rams(
    llm: &LlmClient,
    job: &RamsJob,
    deadline: Duration,
) -> Result<GenerationResult, GenerationError> {
    let generation_id = Uuid::new_v4();
    let span = info_span!("rams_generation", %generation_id, job_type = %job.job_type);

    async move {
        info!(
            "Generating RAMS via {} ({}) with {} hazards",
            llm.provider(),
            llm.model(),
            job.hazards.len()
        );
        let result = with_deadline(deadline, call_llm_with_contract_check(llm, job)).await;
        match &result {
            Ok(r) => info!(
                "RAMS generated: {} steps, {} COSHH entries",
                r.method_statement.len(),
                r.coshh.len()
            ),
            Err(e) => warn!(
                "RAMS generation failed ({}, transient: {}): {e}",
                e.kind(),
                e.is_transient()
            ),
        }
        result
    }
    .instrument(span)
    .await
}

async fn call_llm_with_contract_check(
    llm: &LlmClient,
    job: &RamsJob,
) -> Result<GenerationResult, GenerationError> {
    let prompt = build_rams_prompt(job);
    let system = system_prompt();
    let mut last_violation = String::new();

    for attempt in 0..=MAX_CONTRACT_RETRIES {
        let result: GenerationResult = llm.call_json(&prompt, &system).await?;

        match check_contract(&result, job) {
            Ok(()) => return Ok(result),
            Err(violation) => {
                warn!(
                    "Generation attempt {}/{} broke the content contract: {violation}",
                    attempt + 1,
                    MAX_CONTRACT_RETRIES + 1
                );
                last_violation = violation;
            }
        }
    }

    Err(GenerationError::Contract(last_violation))
}

/// Verifies the model honoured the prompt's placement rules.
pub fn check_contract(result: &GenerationResult, job: &RamsJob) -> Result<(), String> {
    let count = result.method_statement.len();
    if count != METHOD_STEP_COUNT {
        return Err(format!("expected {METHOD_STEP_COUNT} method steps, got {count}"));
    }
    if !result.step("5.1").is_some_and(|s| s.mentions(&job.site_address)) {
        return Err("step 5.1 does not mention the site address".to_string());
    }
    if !result.step("5.4").is_some_and(|s| s.mentions(&job.client_name)) {
        return Err("step 5.4 does not mention the client name".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::llm_client::Provider;
    use crate::rams::models::MethodStep;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn job() -> RamsJob {
        RamsJob {
            job_type: "Roofing".to_string(),
            client_name: "Acme Ltd".to_string(),
            site_address: "12 High St".to_string(),
            job_desc: "Strip and re-tile".to_string(),
            custom_constraints: None,
            hazards: vec!["falls".to_string(), "weather".to_string()],
        }
    }

    fn steps(first: &str, last: &str) -> Vec<MethodStep> {
        vec![
            MethodStep {
                title: "5.1 Site Setup & Access".to_string(),
                description: first.to_string(),
            },
            MethodStep {
                title: "5.2 Preparation".to_string(),
                description: "Inspect scaffold".to_string(),
            },
            MethodStep {
                title: "5.3 Works".to_string(),
                description: "Re-tile roof".to_string(),
            },
            MethodStep {
                title: "5.4 Completion & Handover".to_string(),
                description: last.to_string(),
            },
        ]
    }

    fn model_text(first: &str, last: &str) -> String {
        json!({
            "summary": "Roof replacement",
            "methodStatement": steps(first, last),
            "coshh": [{
                "substance": "Silica dust",
                "risk": "Respiratory harm",
                "control": "Wet cutting, FFP3 masks",
                "disposal": "Bagged and removed"
            }]
        })
        .to_string()
    }

    fn anthropic_body(text: String) -> serde_json::Value {
        json!({
            "content": [{ "type": "text", "text": text }],
            "usage": { "input_tokens": 100, "output_tokens": 200 }
        })
    }

    fn client(server: &MockServer) -> LlmClient {
        LlmClient::new(LlmConfig {
            provider: Provider::Anthropic,
            api_key: Some("test-key".to_string()),
            model: "claude-sonnet-4-5".to_string(),
            base_url: server.uri(),
        })
        .unwrap()
    }

    #[test]
    fn test_contract_accepts_compliant_result() {
        let result = GenerationResult {
            summary: String::new(),
            method_statement: steps("Arrive at 12 High St", "Hand over to Acme Ltd"),
            coshh: vec![],
        };
        assert!(check_contract(&result, &job()).is_ok());
    }

    #[test]
    fn test_contract_rejects_wrong_step_count() {
        let mut result = GenerationResult {
            summary: String::new(),
            method_statement: steps("12 High St", "Acme Ltd"),
            coshh: vec![],
        };
        result.method_statement.pop();
        let err = check_contract(&result, &job()).unwrap_err();
        assert!(err.contains("expected 4"));
    }

    #[test]
    fn test_contract_rejects_missing_client_name() {
        let result = GenerationResult {
            summary: String::new(),
            method_statement: steps("12 High St", "Hand over to the client"),
            coshh: vec![],
        };
        assert!(check_contract(&result, &job()).unwrap_err().contains("5.4"));
    }

    #[tokio::test]
    async fn test_generate_returns_compliant_fenced_output() {
        let server = MockServer::start().await;
        let fenced = format!(
            "```json\n{}\n```",
            model_text("Set up at 12 High St", "Sign-off with Acme Ltd")
        );
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body(fenced)))
            .expect(1)
            .mount(&server)
            .await;

        let result = generate_rams(&client(&server), &job(), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(result.step("5.1").unwrap().mentions("12 High St"));
        assert!(result.step("5.4").unwrap().mentions("Acme Ltd"));
        assert_eq!(result.coshh.len(), 1);
    }

    #[tokio::test]
    async fn test_contract_violation_regenerates_once_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_body(model_text("Arrive on site", "Hand over"))),
            )
            .expect(2)
            .mount(&server)
            .await;

        let err = generate_rams(&client(&server), &job(), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Contract(_)));
    }

    #[tokio::test]
    async fn test_parse_error_is_not_regenerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_body("I cannot produce JSON".to_string())),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = generate_rams(&client(&server), &job(), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Parse(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(anthropic_body(model_text("12 High St", "Acme Ltd")))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = generate_rams(&client(&server), &job(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout(_)));
    }
}

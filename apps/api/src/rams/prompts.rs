// Prompt construction for RAMS generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{hazard_list, HSE_PERSONA, JSON_ONLY_INSTRUCTION};
use crate::rams::models::RamsJob;

/// System prompt for RAMS generation.
pub fn system_prompt() -> String {
    format!("{HSE_PERSONA} {JSON_ONLY_INSTRUCTION}")
}

/// Builds the RAMS generation prompt.
///
/// The site address and client name are embedded verbatim twice: once as job
/// details and once inside the rules that pin them to steps 5.1 and 5.4.
pub fn build_rams_prompt(job: &RamsJob) -> String {
    let job_desc = if job.job_desc.is_empty() {
        "Not provided - use standard practice for this trade"
    } else {
        job.job_desc.as_str()
    };
    let constraints = job.custom_constraints.as_deref().unwrap_or("None");
    let hazards = hazard_list(&job.hazards);

    format!(
        r#"Write the method statement and COSHH section of a RAMS pack for the job below.

JOB DETAILS:
- Job type: {job_type}
- Client: {client_name}
- Site address: {site_address}
- Standard process: {job_desc}
- Custom constraints: {constraints}
- Hazards identified: {hazards}

Return a JSON object with this EXACT schema (no extra fields):
{{
  "summary": "Two or three sentences summarising the works and the key risks",
  "methodStatement": [
    {{"title": "5.1 Site Setup & Access", "description": "..."}},
    {{"title": "5.2 Preparation", "description": "..."}},
    {{"title": "5.3 Carrying Out the Works", "description": "..."}},
    {{"title": "5.4 Completion & Handover", "description": "..."}}
  ],
  "coshh": [
    {{"substance": "Silica dust", "risk": "...", "control": "...", "disposal": "..."}}
  ]
}}

HARD RULES:
1. "methodStatement" MUST contain exactly 4 steps, titled 5.1 to 5.4 in that order
2. Step 5.1 MUST mention the site address exactly as written: "{site_address}"
3. Step 5.4 MUST mention the client name exactly as written: "{client_name}"
4. Address every listed hazard and every custom constraint somewhere in the steps
5. Add one "coshh" entry per hazardous substance the works involve; use [] if there are none
6. Keep each step description under 120 words, written for operatives on site"#,
        job_type = job.job_type,
        client_name = job.client_name,
        site_address = job.site_address,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::prompts::DEFAULT_HAZARDS;

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

    #[test]
    fn test_prompt_embeds_site_address_and_client_name() {
        let prompt = build_rams_prompt(&job());
        assert!(prompt.contains("12 High St"));
        assert!(prompt.contains("Acme Ltd"));
        assert!(prompt.contains("Step 5.1 MUST mention the site address exactly as written: \"12 High St\""));
        assert!(prompt.contains("Step 5.4 MUST mention the client name exactly as written: \"Acme Ltd\""));
    }

    #[test]
    fn test_prompt_embeds_values_containing_braces_literally() {
        let mut job = job();
        job.site_address = "Unit {client_name}, Dock Rd".to_string();
        job.client_name = "{site_address} Holdings".to_string();
        let prompt = build_rams_prompt(&job);
        assert!(prompt.contains("Unit {client_name}, Dock Rd"));
        assert!(prompt.contains("{site_address} Holdings"));
    }

    #[test]
    fn test_prompt_lists_hazards_comma_joined() {
        let prompt = build_rams_prompt(&job());
        assert!(prompt.contains("Hazards identified: falls, weather"));
    }

    #[test]
    fn test_prompt_defaults_hazards_when_absent() {
        let mut job = job();
        job.hazards.clear();
        let prompt = build_rams_prompt(&job);
        assert!(prompt.contains(&format!("Hazards identified: {DEFAULT_HAZARDS}")));
    }

    #[test]
    fn test_prompt_includes_custom_constraints() {
        let mut job = job();
        assert!(build_rams_prompt(&job).contains("Custom constraints: None"));
        job.custom_constraints = Some("No work before 8am".to_string());
        assert!(build_rams_prompt(&job).contains("Custom constraints: No work before 8am"));
    }

    #[test]
    fn test_prompt_requests_json_schema_keys() {
        let prompt = build_rams_prompt(&job());
        for key in ["\"summary\"", "\"methodStatement\"", "\"coshh\"", "\"disposal\""] {
            assert!(prompt.contains(key), "prompt missing {key}");
        }
        assert!(system_prompt().contains("valid JSON only"));
    }
}

// Prompt construction for toolbox-talk generation.

use crate::llm_client::prompts::{hazard_list, HSE_PERSONA, JSON_ONLY_INSTRUCTION};
use crate::toolbox::models::ToolboxTalk;

pub fn system_prompt() -> String {
    format!(
        "{HSE_PERSONA} You prepare short on-site safety briefings delivered by supervisors. \
         {JSON_ONLY_INSTRUCTION}"
    )
}

pub fn build_toolbox_prompt(talk: &ToolboxTalk) -> String {
    let not_specified = "Not specified";
    let job_type = talk.job_type.as_deref().unwrap_or("General construction");
    let location = talk.location.as_deref().unwrap_or(not_specified);
    let presenter = talk.presenter.as_deref().unwrap_or(not_specified);
    let notes = talk.notes.as_deref().unwrap_or("None");
    let hazards = hazard_list(&talk.hazards);
    let date = talk.display_date();

    format!(
        r#"Write a toolbox talk that a supervisor can read aloud in about ten minutes.

TALK DETAILS:
- Topic: {topic}
- Trade / job type: {job_type}
- Date: {date}
- Location: {location}
- Presenter: {presenter}
- Hazards to cover: {hazards}
- Additional notes: {notes}

Return a JSON object with this EXACT schema (no extra fields):
{{
  "title": "Toolbox Talk: ...",
  "headerInfo": {{"topic": "...", "date": "{date}", "location": "...", "presenter": "..."}},
  "introduction": "Why this topic matters on this job",
  "hazards": [{{"hazard": "...", "description": "..."}}],
  "controlMeasures": [{{"measure": "...", "description": "..."}}],
  "emergencyProcedures": "What to do if something goes wrong",
  "keyMessages": ["..."],
  "ppe": [{{"item": "...", "description": "..."}}],
  "attendeeDeclaration": "Statement attendees sign to confirm they understood the talk"
}}

HARD RULES:
1. Cover every listed hazard with at least one control measure
2. Give 3 to 6 key messages, each a single short sentence
3. Use plain language suitable for operatives on site"#,
        topic = talk.topic,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn talk() -> ToolboxTalk {
        ToolboxTalk {
            topic: "Working at height".to_string(),
            job_type: Some("Roofing".to_string()),
            location: Some("12 High St".to_string()),
            presenter: None,
            date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            hazards: vec!["falls".to_string(), "fragile roofs".to_string()],
            notes: None,
        }
    }

    #[test]
    fn test_prompt_embeds_talk_details() {
        let prompt = build_toolbox_prompt(&talk());
        assert!(prompt.contains("Topic: Working at height"));
        assert!(prompt.contains("Location: 12 High St"));
        assert!(prompt.contains("Presenter: Not specified"));
        assert!(prompt.contains("Date: 04/03/2026"));
        assert!(prompt.contains("Hazards to cover: falls, fragile roofs"));
    }

    #[test]
    fn test_prompt_requests_full_schema() {
        let prompt = build_toolbox_prompt(&talk());
        for key in [
            "\"headerInfo\"",
            "\"controlMeasures\"",
            "\"emergencyProcedures\"",
            "\"keyMessages\"",
            "\"ppe\"",
            "\"attendeeDeclaration\"",
        ] {
            assert!(prompt.contains(key), "prompt missing {key}");
        }
    }
}

// Shared prompt fragments.
// Each generator defines its own prompts.rs alongside it; this file holds the
// cross-cutting pieces they all embed.

/// Persona line shared by every generator.
pub const HSE_PERSONA: &str = "You are an experienced UK health and safety consultant \
    who writes site documentation for tradespeople. \
    Use UK spelling and refer to UK legislation (HSWA 1974, CDM 2015, COSHH 2002) where relevant.";

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Placeholder used when the caller supplies no hazard labels.
pub const DEFAULT_HAZARDS: &str = "General site hazards";

/// Joins hazard labels for embedding in a prompt, falling back to a placeholder.
pub fn hazard_list(hazards: &[String]) -> String {
    if hazards.is_empty() {
        DEFAULT_HAZARDS.to_string()
    } else {
        hazards.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_list_joins_with_commas() {
        let hazards = vec!["falls".to_string(), "weather".to_string()];
        assert_eq!(hazard_list(&hazards), "falls, weather");
    }

    #[test]
    fn test_hazard_list_defaults_when_empty() {
        assert_eq!(hazard_list(&[]), DEFAULT_HAZARDS);
    }
}

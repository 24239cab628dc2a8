//! Fallback selection: AI output is optional sugar over deterministic boilerplate.
//!
//! `select_outcome` is the only place a `GenerationError` is turned into a
//! caller-facing payload for the RAMS endpoint.

use serde::Serialize;

use crate::llm_client::prompts::hazard_list;
use crate::llm_client::GenerationError;
use crate::rams::models::{CoshhEntry, GenerationResult, MethodStep, RamsJob};

/// What the generation endpoint returns. Both variants are sent with HTTP 200 so
/// the dashboard can branch on payload shape alone.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateOutcome {
    Generated(GenerationResult),
    Fallback(FallbackPayload),
}

#[derive(Debug, Serialize)]
pub struct FallbackPayload {
    pub error: String,
    pub fallback: bool,
    pub boilerplate: GenerationResult,
}

pub fn select_outcome(
    result: Result<GenerationResult, GenerationError>,
    job: &RamsJob,
) -> GenerateOutcome {
    match result {
        Ok(generated) => GenerateOutcome::Generated(generated),
        Err(e) => GenerateOutcome::Fallback(FallbackPayload {
            error: fallback_message(&e).to_string(),
            fallback: true,
            boilerplate: boilerplate(job),
        }),
    }
}

fn fallback_message(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::Configuration(_) => "AI generation is not configured",
        GenerationError::Upstream(_) => "The AI service is unavailable",
        GenerationError::Timeout(_) => "The AI service took too long to respond",
        GenerationError::Parse(_) | GenerationError::Contract(_) => {
            "The AI service returned an unusable document"
        }
    }
}

/// Substances implied by common hazard labels: (keyword, substance, risk, control, disposal).
const COSHH_LIBRARY: &[(&str, &str, &str, &str, &str)] = &[
    (
        "dust",
        "Construction dust (including silica)",
        "Inhalation can cause silicosis and other lung disease",
        "Use on-tool extraction or wet cutting; wear FFP3 masks; damp down work areas",
        "Bag dust and debris and remove as construction waste",
    ),
    (
        "asbestos",
        "Asbestos-containing materials",
        "Inhaled fibres cause mesothelioma and asbestosis",
        "Stop work if suspected; only licensed contractors may disturb ACMs",
        "Double-bag, label and dispose of via a licensed carrier",
    ),
    (
        "solvent",
        "Solvent-based products",
        "Vapour inhalation causes dizziness; flammable",
        "Ventilate the area; keep away from ignition sources; wear nitrile gloves",
        "Return unused product to store; dispose of rags and tins as hazardous waste",
    ),
    (
        "paint",
        "Paints and coatings",
        "Skin and eye irritation; vapour inhalation",
        "Use in ventilated areas; wear gloves and eye protection",
        "Seal tins and dispose of via a licensed waste carrier",
    ),
    (
        "cement",
        "Cement and mortar",
        "Alkaline burns and dermatitis from wet cement",
        "Wear waterproof gloves and long sleeves; wash skin promptly",
        "Allow waste to set and dispose of as inert waste",
    ),
    (
        "fuel",
        "Fuels (petrol/diesel)",
        "Highly flammable; harmful vapour",
        "Store in approved containers away from ignition sources; refuel with engines off",
        "Return surplus to store; absorb spills and dispose of as hazardous waste",
    ),
    (
        "adhesive",
        "Adhesives and sealants",
        "Skin sensitisation and vapour inhalation",
        "Ventilate; wear gloves; follow the manufacturer's safety data sheet",
        "Dispose of cured waste as general waste and uncured as hazardous waste",
    ),
    (
        "chemical",
        "Chemical products",
        "Harm through skin contact, inhalation or ingestion",
        "Follow the safety data sheet; wear the PPE it specifies",
        "Dispose of according to the safety data sheet via a licensed carrier",
    ),
];

/// Deterministic RAMS content honouring the same placement rules as the AI prompt.
pub fn boilerplate(job: &RamsJob) -> GenerationResult {
    let hazards = hazard_list(&job.hazards);
    let process = if job.job_desc.is_empty() {
        "the standard procedure for this trade"
    } else {
        job.job_desc.as_str()
    };
    let constraints = job
        .custom_constraints
        .as_deref()
        .map(|c| format!(" Site-specific requirements: {c}."))
        .unwrap_or_default();

    GenerationResult {
        summary: format!(
            "{} works for {} at {}. Key hazards: {}.",
            job.job_type, job.client_name, job.site_address, hazards
        ),
        method_statement: vec![
            MethodStep {
                title: "5.1 Site Setup & Access".to_string(),
                description: format!(
                    "On arrival at {}, sign in with the site contact and brief all operatives on this RAMS. \
                     Establish exclusion zones, welfare facilities and safe access before any {} work begins.",
                    job.site_address, job.job_type
                ),
            },
            MethodStep {
                title: "5.2 Preparation".to_string(),
                description: format!(
                    "Inspect tools, plant and access equipment before use. \
                     Confirm controls are in place for: {hazards}.{constraints}"
                ),
            },
            MethodStep {
                title: "5.3 Carrying Out the Works".to_string(),
                description: format!(
                    "Carry out the works following {process}. \
                     Supervise continuously and stop work if conditions change or new hazards arise."
                ),
            },
            MethodStep {
                title: "5.4 Completion & Handover".to_string(),
                description: format!(
                    "Clear the work area and remove all waste. Walk the completed works through with {} \
                     and obtain sign-off before leaving site.",
                    job.client_name
                ),
            },
        ],
        coshh: coshh_for(&job.hazards),
    }
}

fn coshh_for(hazards: &[String]) -> Vec<CoshhEntry> {
    let lowered: Vec<String> = hazards.iter().map(|h| h.to_lowercase()).collect();
    COSHH_LIBRARY
        .iter()
        .filter(|(keyword, ..)| lowered.iter().any(|h| h.contains(keyword)))
        .map(|(_, substance, risk, control, disposal)| CoshhEntry {
            substance: substance.to_string(),
            risk: risk.to_string(),
            control: control.to_string(),
            disposal: disposal.to_string(),
        })
        .collect()
}

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::validation::{labels, optional_text, required_text};

/// Number of method-statement steps every RAMS pack carries (5.1 – 5.4).
pub const METHOD_STEP_COUNT: usize = 4;

/// Raw request body for RAMS generation, as posted by the dashboard.
/// Nothing here is trusted until `validate()` produces a `RamsJob`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationRequest {
    pub job_type: String,
    pub client_name: String,
    pub site_address: String,
    pub job_desc: String,
    pub custom_constraints: Option<String>,
    pub hazards: Option<Vec<String>>,
}

/// A validated generation request. Client name and site address are guaranteed
/// non-empty because the model is told to echo them verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RamsJob {
    pub job_type: String,
    pub client_name: String,
    pub site_address: String,
    pub job_desc: String,
    pub custom_constraints: Option<String>,
    pub hazards: Vec<String>,
}

impl GenerationRequest {
    pub fn validate(self) -> Result<RamsJob, AppError> {
        Ok(RamsJob {
            job_type: required_text("jobType", &self.job_type)?,
            client_name: required_text("clientName", &self.client_name)?,
            site_address: required_text("siteAddress", &self.site_address)?,
            job_desc: optional_text("jobDesc", Some(self.job_desc.as_str()))?.unwrap_or_default(),
            custom_constraints: optional_text(
                "customConstraints",
                self.custom_constraints.as_deref(),
            )?,
            hazards: labels("hazards", self.hazards.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodStep {
    pub title: String,
    pub description: String,
}

impl MethodStep {
    /// Case-insensitive search across title and description.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoshhEntry {
    pub substance: String,
    pub risk: String,
    pub control: String,
    pub disposal: String,
}

/// The generated section of a RAMS pack, merged into the full document by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub summary: String,
    pub method_statement: Vec<MethodStep>,
    #[serde(default)]
    pub coshh: Vec<CoshhEntry>,
}

impl GenerationResult {
    /// Looks up a step by its RAMS label, e.g. `"5.1"`.
    pub fn step(&self, label: &str) -> Option<&MethodStep> {
        let index: usize = label.strip_prefix("5.")?.parse().ok()?;
        self.method_statement.get(index.checked_sub(1)?)
    }
}

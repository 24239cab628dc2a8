use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;
use crate::validation::{labels, optional_text, required_text};

/// Raw request body for toolbox-talk generation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolboxTalkRequest {
    pub topic: String,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub presenter: Option<String>,
    /// ISO date (`YYYY-MM-DD`); defaults to today.
    pub date: Option<String>,
    pub hazards: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// A validated toolbox-talk request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolboxTalk {
    pub topic: String,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub presenter: Option<String>,
    pub date: NaiveDate,
    pub hazards: Vec<String>,
    pub notes: Option<String>,
}

impl ToolboxTalk {
    /// UK-style date used in the document header.
    pub fn display_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}

impl ToolboxTalkRequest {
    pub fn validate(self, today: NaiveDate) -> Result<ToolboxTalk, AppError> {
        let topic = required_text("topic", &self.topic)?;
        let job_type = optional_text("jobType", self.job_type.as_deref())?;
        let location = optional_text("location", self.location.as_deref())?;
        let presenter = optional_text("presenter", self.presenter.as_deref())?;

        let date = match optional_text("date", self.date.as_deref())? {
            Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("date must be in YYYY-MM-DD format, got '{raw}'"))
            })?,
            None => today,
        };

        Ok(ToolboxTalk {
            topic,
            job_type,
            location,
            presenter,
            date,
            hazards: labels("hazards", self.hazards.as_deref())?,
            notes: optional_text("notes", self.notes.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderInfo {
    pub topic: String,
    pub date: String,
    pub location: String,
    pub presenter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardItem {
    pub hazard: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMeasure {
    pub measure: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpeItem {
    pub item: String,
    pub description: String,
}

/// A generated toolbox talk, ready to be laid out as a briefing sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxTalkResult {
    pub title: String,
    #[serde(default)]
    pub header_info: HeaderInfo,
    #[serde(deserialize_with = "text_or_lines")]
    pub introduction: String,
    #[serde(default)]
    pub hazards: Vec<HazardItem>,
    #[serde(default)]
    pub control_measures: Vec<ControlMeasure>,
    #[serde(deserialize_with = "text_or_lines")]
    pub emergency_procedures: String,
    #[serde(default)]
    pub key_messages: Vec<String>,
    #[serde(default)]
    pub ppe: Vec<PpeItem>,
    #[serde(deserialize_with = "text_or_lines")]
    pub attendee_declaration: String,
}

/// Accepts a paragraph or a list of lines, joined with newlines.
fn text_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrLines {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match TextOrLines::deserialize(deserializer)? {
        TextOrLines::Text(text) => text,
        TextOrLines::Lines(lines) => lines.join("\n"),
    })
}

impl ToolboxTalkResult {
    /// Overwrites header fields with what the caller actually supplied; the model
    /// only fills the gaps.
    pub fn apply_request_header(&mut self, talk: &ToolboxTalk) {
        self.header_info.topic = talk.topic.clone();
        self.header_info.date = talk.display_date();
        if let Some(location) = &talk.location {
            self.header_info.location = location.clone();
        }
        if let Some(presenter) = &talk.presenter {
            self.header_info.presenter = presenter.clone();
        }
        if self.title.trim().is_empty() {
            self.title = format!("Toolbox Talk: {}", talk.topic);
        }
    }
}

//! Boundary validation helpers shared by the request types.
//!
//! Each helper trims its input and rejects with a field-specific message, so a request
//! is rejected on its first violation.

use crate::errors::AppError;

pub const MAX_TEXT_LEN: usize = 4000;
pub const MAX_LABELS: usize = 30;
pub const MAX_LABEL_LEN: usize = 200;

pub fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    check_length(field, value, MAX_TEXT_LEN)?;
    Ok(value.to_string())
}

/// Blank strings are treated as absent.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            check_length(field, v, MAX_TEXT_LEN)?;
            Ok(Some(v.to_string()))
        }
        None => Ok(None),
    }
}

/// Trims labels and drops blank ones.
pub fn labels(field: &str, values: Option<&[String]>) -> Result<Vec<String>, AppError> {
    let labels: Vec<String> = values
        .unwrap_or_default()
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if labels.len() > MAX_LABELS {
        return Err(AppError::Validation(format!(
            "{field} may contain at most {MAX_LABELS} entries"
        )));
    }
    for label in &labels {
        check_length(field, label, MAX_LABEL_LEN)?;
    }
    Ok(labels)
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

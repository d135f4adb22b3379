use serde::Serialize;
use serde_json::{Map, Value};

use crate::scanner::{ScanOutcome, find_json_object};

pub const NO_JSON_FOUND: &str = "No valid JSON found in response";
pub const INVALID_JSON: &str = "Invalid JSON format in response";
pub const RETRIES_EXHAUSTED: &str = "Failed to generate schema after multiple attempts";

/// A generated JSON-LD object, or the error marker `{"error": "..."}`.
///
/// Callers must check [`GeneratedSchema::is_error`] before using the value
/// as markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedSchema {
    Schema(Map<String, Value>),
    Failed { error: String },
}

impl GeneratedSchema {
    pub fn failed(error: impl Into<String>) -> Self {
        GeneratedSchema::Failed { error: error.into() }
    }

    /// Interpret raw model output. Neither failure here is worth a retry.
    pub fn from_model_output(raw: &str) -> Self {
        match find_json_object(raw) {
            ScanOutcome::Found(map) => GeneratedSchema::Schema(map),
            ScanOutcome::Invalid => GeneratedSchema::failed(INVALID_JSON),
            ScanOutcome::Missing => GeneratedSchema::failed(NO_JSON_FOUND),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GeneratedSchema::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GeneratedSchema::Failed { error } => Some(error),
            GeneratedSchema::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Map<String, Value>> {
        match self {
            GeneratedSchema::Schema(map) => Some(map),
            GeneratedSchema::Failed { .. } => None,
        }
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// The downloadable markup: pretty JSON inside an ld+json script tag.
    pub fn script_tag(&self) -> String {
        format!("<script type=\"application/ld+json\">\n{}\n</script>", self.pretty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub accuracy: f64,
    pub missing_fields: Vec<String>,
    pub additional_fields: Vec<String>,
    pub detailed_comparison: String,
}

/// A parsed comparison, or the error marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Comparison {
    Compared(ComparisonResult),
    Failed { error: String },
}

impl Comparison {
    pub fn failed(error: impl Into<String>) -> Self {
        Comparison::Failed { error: error.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Comparison::Failed { .. })
    }

    pub fn result(&self) -> Option<&ComparisonResult> {
        match self {
            Comparison::Compared(result) => Some(result),
            Comparison::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Comparison::Failed { error } => Some(error),
            Comparison::Compared(_) => None,
        }
    }
}

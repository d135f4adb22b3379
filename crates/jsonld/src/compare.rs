use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::llm::ChatCompletion;
use crate::prompt::{COMPARISON_SYSTEM_PROMPT, build_comparison_prompt};
use crate::schema::{Comparison, ComparisonResult};

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent pattern"));
static MISSING_FIELDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Missing fields: (.+)").expect("valid missing-fields pattern"));
static ADDITIONAL_FIELDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Additional fields: (.+)").expect("valid additional-fields pattern")
});

/// Asks the model how closely a user's schema matches a generated one.
pub struct SchemaComparator {
    client: Arc<dyn ChatCompletion>,
}

impl SchemaComparator {
    pub fn new(client: Arc<dyn ChatCompletion>) -> Self {
        Self { client }
    }

    /// One completion, no retry. Request and parse failures both come back
    /// as the error marker.
    pub async fn compare(&self, user_schema: &str, generated_schema: &str) -> Comparison {
        let prompt = build_comparison_prompt(user_schema, generated_schema);

        let response = match self.client.complete(COMPARISON_SYSTEM_PROMPT, &prompt).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Error comparing schemas");
                return Comparison::failed(format!("{:#}", e));
            }
        };

        match parse_comparison(&response) {
            Ok(result) => {
                debug!(accuracy = result.accuracy, "Schemas compared");
                Comparison::Compared(result)
            }
            Err(e) => {
                error!(error = %e, "Error comparing schemas");
                Comparison::failed(e.to_string())
            }
        }
    }
}

/// Pull the score and field lists out of the model's narrative.
///
/// The first `NN%` / `NN.N%` is the score and its absence is an error.
/// Each `Missing fields: ...` / `Additional fields: ...` line contributes one
/// entry holding the rest of that line.
pub fn parse_comparison(response: &str) -> Result<ComparisonResult> {
    let accuracy: f64 = PERCENT
        .captures(response)
        .and_then(|caps| caps.get(1))
        .context("No valid accuracy score found in response")?
        .as_str()
        .parse()
        .context("Accuracy score is not a number")?;

    Ok(ComparisonResult {
        accuracy,
        missing_fields: rest_of_lines(&MISSING_FIELDS, response),
        additional_fields: rest_of_lines(&ADDITIONAL_FIELDS, response),
        detailed_comparison: response.to_string(),
    })
}

fn rest_of_lines(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub mod compare;
pub mod llm;
pub mod prompt;
pub mod retry;
pub mod scanner;
pub mod schema;
pub mod usage;

pub use compare::{SchemaComparator, parse_comparison};
pub use llm::{AzureOpenAiClient, ChatCompletion, SamplingParams};
pub use retry::RetryPolicy;
pub use schema::{Comparison, ComparisonResult, GeneratedSchema};
pub use usage::UsageEstimate;

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::prompt::{SCHEMA_SYSTEM_PROMPT, build_generation_prompt};
use crate::schema::RETRIES_EXHAUSTED;

/// Turns extracted page text into a JSON-LD object.
pub struct SchemaGenerator {
    client: Arc<dyn ChatCompletion>,
    retry: RetryPolicy,
}

impl SchemaGenerator {
    pub fn new(client: Arc<dyn ChatCompletion>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Generate with the configured number of attempts.
    pub async fn generate(
        &self,
        text: &str,
        url: Option<&str>,
        user_prompt: Option<&str>,
    ) -> GeneratedSchema {
        self.generate_with_attempts(text, url, user_prompt, self.retry.max_attempts())
            .await
    }

    /// Only request failures are retried. Output without a usable JSON object
    /// is returned as the error marker straight away.
    pub async fn generate_with_attempts(
        &self,
        text: &str,
        url: Option<&str>,
        user_prompt: Option<&str>,
        max_attempts: usize,
    ) -> GeneratedSchema {
        // the url is not part of the prompt
        info!(url = url.unwrap_or("-"), chars = text.len(), "Generating schema");

        let prompt = build_generation_prompt(user_prompt, text);
        let policy = self.retry.with_max_attempts(max_attempts);

        let raw = policy
            .retry("generate_schema", || {
                self.client.complete(SCHEMA_SYSTEM_PROMPT, &prompt)
            })
            .await;

        match raw {
            Ok(raw) => {
                let schema = GeneratedSchema::from_model_output(&raw);
                match schema.error() {
                    Some(reason) => error!(error = reason, "Model output held no schema"),
                    None => debug!(response_chars = raw.len(), "Schema generated"),
                }
                schema
            }
            Err(e) => {
                error!(
                    attempts = policy.max_attempts(),
                    error = %e,
                    "Schema generation failed"
                );
                GeneratedSchema::failed(RETRIES_EXHAUSTED)
            }
        }
    }
}

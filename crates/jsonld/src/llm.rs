use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single-turn chat completion: one system message, one user message,
/// one text reply.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Sampling settings sent with every request.
#[derive(Debug, Clone, Serialize)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Option<Vec<String>>,
    pub stream: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 3000,
            temperature: 0.0,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: None,
            stream: false,
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    #[serde(flatten)]
    sampling: &'a SamplingParams,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completions against an Azure OpenAI deployment.
#[derive(Clone)]
pub struct AzureOpenAiClient {
    endpoint: String,
    deployment: String,
    api_key: String,
    api_version: String,
    sampling: SamplingParams,
    client: reqwest::Client,
}

impl AzureOpenAiClient {
    pub fn new(endpoint: String, deployment: String, api_key: String, api_version: String) -> Self {
        Self {
            endpoint,
            deployment,
            api_key,
            api_version,
            sampling: SamplingParams::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[async_trait]
impl ChatCompletion for AzureOpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let start = std::time::Instant::now();

        let request = ChatRequest {
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            sampling: &self.sampling,
        };

        let response = self.client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Azure OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Azure OpenAI request failed: {} {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Azure OpenAI response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Azure OpenAI returned no completion")?;

        debug!(
            deployment = %self.deployment,
            duration_ms = start.elapsed().as_millis(),
            chars = content.len(),
            "Chat completion"
        );

        Ok(content)
    }
}

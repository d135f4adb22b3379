use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use ingest::{ContentSource, IngestConfig};
use jsonld::{Comparison, GeneratedSchema, SchemaComparator, SchemaGenerator, UsageEstimate};

pub struct AppState {
    pub generator: SchemaGenerator,
    pub comparator: SchemaComparator,
    pub ingest: IngestConfig,
    /// Upper bound on a request's `retries`.
    pub max_attempts: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schema/generate", post(generate_schema))
        .route("/schema/compare", post(compare_schemas))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Static,
    #[default]
    Dynamic,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub url: Option<String>,
    pub json: Option<String>,
    #[serde(default)]
    pub mode: ExtractionMode,
    pub prompt: Option<String>,
    pub retries: Option<usize>,
}

impl GenerateRequest {
    /// Exactly one of `url` and `json` must be given.
    pub fn source(&self) -> Result<ContentSource, String> {
        match (&self.url, &self.json) {
            (Some(url), None) => Ok(match self.mode {
                ExtractionMode::Static => ContentSource::StaticUrl(url.clone()),
                ExtractionMode::Dynamic => ContentSource::DynamicUrl(url.clone()),
            }),
            (None, Some(json)) => Ok(ContentSource::Json(json.clone())),
            (None, None) => Err("request must include either `url` or `json`".to_string()),
            (Some(_), Some(_)) => Err("request must include only one of `url` and `json`".to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub schema: GeneratedSchema,
    pub script_tag: String,
    pub usage: UsageEstimate,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub user_schema: String,
    /// Schema text, or the schema posted as a JSON object.
    pub generated_schema: Value,
}

fn schema_text(schema: Value) -> String {
    match schema {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Input,
    Model,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

fn error_response(status: StatusCode, kind: ErrorKind, error: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: error.into(), kind })).into_response()
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn generate_schema(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let source = match request.source() {
        Ok(source) => source,
        Err(message) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::Input, message);
        }
    };

    let text = match ingest::extract_text(&source, &state.ingest).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Content extraction failed");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, ErrorKind::Input, e.to_string());
        }
    };

    let attempts = request
        .retries
        .unwrap_or_else(|| state.generator.retry_policy().max_attempts())
        .min(state.max_attempts);

    let schema = state
        .generator
        .generate_with_attempts(&text, source.url(), request.prompt.as_deref(), attempts)
        .await;

    if let Some(error) = schema.error() {
        return error_response(StatusCode::BAD_GATEWAY, ErrorKind::Model, error);
    }

    let usage = UsageEstimate::estimate(&text, &schema.pretty());
    info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        total_cost = usage.total_cost,
        "Schema ready"
    );

    let body = GenerateResponse {
        script_tag: schema.script_tag(),
        schema,
        usage,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn compare_schemas(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Response {
    if let Err(e) = serde_json::from_str::<Value>(&request.user_schema) {
        warn!(error = %e, "User schema is not valid JSON");
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Input,
            format!("Invalid JSON format in user schema: {}", e),
        );
    }

    let generated = schema_text(request.generated_schema);

    match state.comparator.compare(&request.user_schema, &generated).await {
        Comparison::Failed { error } => error_response(StatusCode::BAD_GATEWAY, ErrorKind::Model, error),
        compared => (StatusCode::OK, Json(compared)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use jsonld::{ChatCompletion, RetryPolicy};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always answers with the same text, or always fails when `reply` is
    /// `None`.
    struct CannedClient {
        reply: Option<String>,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl CannedClient {
        fn new(reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl ChatCompletion for CannedClient {
        async fn complete(&self, _system: &str, user: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = user.to_string();
            self.reply.clone().ok_or_else(|| anyhow!("service unavailable"))
        }
    }

    fn state(client: Arc<CannedClient>) -> Arc<AppState> {
        Arc::new(AppState {
            generator: SchemaGenerator::new(client.clone(), RetryPolicy::fixed(3, 0)),
            comparator: SchemaComparator::new(client),
            ingest: IngestConfig::default(),
            max_attempts: 5,
        })
    }

    fn generate_request(body: Value) -> Json<GenerateRequest> {
        Json(serde_json::from_value(body).unwrap())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_source_selection() {
        let request: GenerateRequest =
            serde_json::from_value(serde_json::json!({"url": "https://a.test"})).unwrap();
        assert_eq!(
            request.source().unwrap(),
            ContentSource::DynamicUrl("https://a.test".to_string())
        );

        let request: GenerateRequest =
            serde_json::from_value(serde_json::json!({"url": "https://a.test", "mode": "static"}))
                .unwrap();
        assert_eq!(
            request.source().unwrap(),
            ContentSource::StaticUrl("https://a.test".to_string())
        );

        let request: GenerateRequest =
            serde_json::from_value(serde_json::json!({"url": "https://a.test", "json": "{}"}))
                .unwrap();
        assert!(request.source().is_err());
    }

    #[tokio::test]
    async fn test_generate_from_json() {
        let client = CannedClient::new(Some(
            r#"Schema: {"@context":"https://schema.org","@type":"Product","url":"https://shop.test","description":"Mug"}"#,
        ));

        let response = generate_schema(
            State(state(client.clone())),
            generate_request(serde_json::json!({"json": "{\"name\": \"Mug\"}"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["schema"]["@type"], "Product");
        assert!(body["script_tag"]
            .as_str()
            .unwrap()
            .starts_with("<script type=\"application/ld+json\">"));
        assert!(body["usage"]["input_tokens"].as_u64().unwrap() > 0);
        assert!(client.last_prompt.lock().unwrap().contains("\"name\": \"Mug\""));
    }

    #[tokio::test]
    async fn test_generate_without_source() {
        let client = CannedClient::new(Some("{}"));

        let response = generate_schema(State(state(client.clone())), generate_request(serde_json::json!({}))).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["kind"], "input");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_invalid_upload() {
        let client = CannedClient::new(Some("{}"));

        let response = generate_schema(
            State(state(client.clone())),
            generate_request(serde_json::json!({"json": "{not json"})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_model_failure() {
        let client = CannedClient::new(None);

        let response = generate_schema(
            State(state(client.clone())),
            generate_request(serde_json::json!({"json": "{}", "retries": 2})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "model");
        assert_eq!(body["error"], "Failed to generate schema after multiple attempts");
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_compare_with_object_schema() {
        let client = CannedClient::new(Some("Accuracy: 75%\nMissing fields: image\nAdditional fields: None"));

        let request: CompareRequest = serde_json::from_value(serde_json::json!({
            "user_schema": "{\"@type\": \"Article\"}",
            "generated_schema": {"@type": "Article", "image": "https://a.test/i.png"}
        }))
        .unwrap();

        let response = compare_schemas(State(state(client.clone())), Json(request)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["accuracy"], 75.0);
        assert_eq!(body["missing_fields"][0], "image");
        assert!(client.last_prompt.lock().unwrap().contains("\"image\": \"https://a.test/i.png\""));
    }

    #[tokio::test]
    async fn test_compare_without_score() {
        let client = CannedClient::new(Some("They are similar."));

        let request: CompareRequest = serde_json::from_value(serde_json::json!({
            "user_schema": "{}",
            "generated_schema": "{}"
        }))
        .unwrap();

        let response = compare_schemas(State(state(client)), Json(request)).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No valid accuracy score found in response");
    }

    #[tokio::test]
    async fn test_generate_retries_capped() {
        let client = CannedClient::new(None);

        let response = generate_schema(
            State(state(client.clone())),
            generate_request(serde_json::json!({"json": "{}", "retries": 1000000})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_compare_rejects_invalid_user_schema() {
        let client = CannedClient::new(Some("Accuracy: 90%"));

        let request: CompareRequest = serde_json::from_value(serde_json::json!({
            "user_schema": "{this is not json",
            "generated_schema": {"@type": "Article"}
        }))
        .unwrap();

        let response = compare_schemas(State(state(client.clone())), Json(request)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "input");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON format"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}

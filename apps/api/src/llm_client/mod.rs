/// Completion Gateway: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the model provider directly.
/// Orchestrators receive an `Arc<dyn CompletionProvider>` and go through it.
///
/// The gateway never inspects the text of a successful response. Shape checks
/// belong to `generation::normalizer`.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::conversation::{ChatMessage, ChatRole};

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transport failures, rate limiting and provider 5xx are worth another attempt.
    /// Auth and request errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Decode(_) | LlmError::EmptyContent => false,
        }
    }
}

/// Capability every orchestrator depends on. Implement this to route generation
/// to another provider or model without touching orchestration logic.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends `system_prompt` followed by `turns` and returns the raw reply text.
    /// With `json_mode` the provider is asked to constrain output to a JSON document.
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, LlmError>;
}

/// Bounded retry for transient upstream failures.
///
/// `max_retries = 0` means a single attempt with no retry at all.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Total wall-clock budget across all attempts and sleeps.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff (initial, 2x, 4x, ...) plus up to 50% random jitter.
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let jitter_ms = rand::thread_rng().gen_range(0..=(base.as_millis() as u64 / 2));
        base + Duration::from_millis(jitter_ms)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (OpenAI-compatible chat completions)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    /// Some gateways report provider failures inside a 200 body.
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Api {
                status: 200,
                message: error.message,
            });
        }
        if let Some(usage) = &self.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyContent)
    }
}

fn build_messages<'a>(system_prompt: &'a str, turns: &'a [ChatMessage]) -> Vec<WireMessage<'a>> {
    std::iter::once(WireMessage {
        role: ChatRole::System.as_str(),
        content: system_prompt,
    })
    .chain(turns.iter().map(|m| WireMessage {
        role: m.role().as_str(),
        content: m.content(),
    }))
    .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Concrete adapter
// ────────────────────────────────────────────────────────────────────────────

/// OpenAI-compatible chat-completions adapter (OpenRouter by default).
/// Built once at startup and shared behind an `Arc`.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl ChatCompletionClient {
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.llm_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: format!(
                "{}/chat/completions",
                config.llm_base_url.trim_end_matches('/')
            ),
            api_key: config.openrouter_api_key.clone(),
            model: config.llm_model.clone(),
            retry: RetryPolicy {
                max_retries: config.llm_max_retries,
                max_elapsed: Duration::from_millis(config.llm_retry_budget_ms),
                ..RetryPolicy::default()
            },
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<ChatResponse>(&text)?.into_text()
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        turns: &[ChatMessage],
        json_mode: bool,
    ) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(system_prompt, turns),
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let started = Instant::now();
        let mut attempt = 0;

        loop {
            let err = match self.send_once(&body).await {
                Ok(text) => return Ok(text),
                Err(e) => e,
            };

            attempt += 1;
            if !err.is_transient() || attempt > self.retry.max_retries {
                return Err(err);
            }

            let delay = self.retry.backoff(attempt);
            if started.elapsed() + delay > self.retry.max_elapsed {
                warn!("LLM retry budget exhausted after {attempt} attempt(s): {err}");
                return Err(err);
            }

            warn!(
                "LLM call attempt {} failed ({}), retrying after {}ms...",
                attempt,
                err,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_leads_history_in_order() {
        let turns = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::user("explain ownership"),
        ];
        let messages = build_messages("be terse", &turns);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "be terse");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].content, "explain ownership");
    }

    #[test]
    fn test_json_mode_sets_response_format() {
        let turns = vec![ChatMessage::user("quiz me")];
        let body = ChatRequest {
            model: "google/gemini-2.0-flash-001",
            messages: build_messages("sys", &turns),
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["model"], "google/gemini-2.0-flash-001");
    }

    #[test]
    fn test_plain_mode_omits_response_format() {
        let body = ChatRequest {
            model: "m",
            messages: build_messages("sys", &[]),
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_response_text_is_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hello"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_text().unwrap(), "Hello");
    }

    #[test]
    fn test_empty_choices_is_empty_content() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(response.into_text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_error_inside_success_body_is_api_error() {
        let json = r#"{"error": {"message": "Provider returned error", "code": 502}}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        match response.into_text() {
            Err(LlmError::Api { message, .. }) => assert_eq!(message, "Provider returned error"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_transient_classification() {
        let rate_limited = LlmError::Api {
            status: 429,
            message: String::new(),
        };
        let unavailable = LlmError::Api {
            status: 503,
            message: String::new(),
        };
        let unauthorized = LlmError::Api {
            status: 401,
            message: String::new(),
        };
        assert!(rate_limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!LlmError::EmptyContent.is_transient());
    }

    #[test]
    fn test_backoff_grows_and_stays_within_jitter() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_elapsed: Duration::from_secs(5),
        };
        let first = policy.backoff(1);
        let third = policy.backoff(3);
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(150));
        assert!(third >= Duration::from_millis(400) && third <= Duration::from_millis(600));
    }

    #[test]
    fn test_default_policy_never_retries() {
        assert_eq!(RetryPolicy::default().max_retries, 0);
    }

    // ── Adapter against a local upstream ──────────────────────────────────

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    /// Answers every call with the same status and body, recording what it got.
    #[derive(Clone)]
    struct Upstream {
        status: StatusCode,
        body: String,
        hits: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    impl Upstream {
        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    async fn upstream_handler(
        State(upstream): State<Upstream>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        upstream.hits.fetch_add(1, Ordering::SeqCst);
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        upstream.requests.lock().unwrap().push((auth, body));
        (upstream.status, upstream.body.clone())
    }

    async fn spawn_upstream(status: u16, body: &str) -> (String, Upstream) {
        let upstream = Upstream {
            status: StatusCode::from_u16(status).unwrap(),
            body: body.to_string(),
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/chat/completions", post(upstream_handler))
            .with_state(upstream.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), upstream)
    }

    fn client_for(base_url: &str, max_retries: u32) -> ChatCompletionClient {
        let mut config = Config::for_tests();
        config.llm_base_url = base_url.to_string();
        config.llm_max_retries = max_retries;
        let mut client = ChatCompletionClient::from_config(&config).unwrap();
        client.retry.initial_backoff = Duration::from_millis(1);
        client
    }

    #[tokio::test]
    async fn test_client_posts_chat_request_and_reads_reply() {
        let reply = json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]});
        let (base_url, upstream) = spawn_upstream(200, &reply.to_string()).await;
        let turns = vec![ChatMessage::user("hi")];

        let text = client_for(&base_url, 0)
            .complete("be terse", &turns, true)
            .await
            .unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(upstream.hits(), 1);
        let requests = upstream.requests.lock().unwrap();
        let (auth, body) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer test-key"));
        assert_eq!(body["model"], "google/gemini-2.0-flash-001");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_transient_status_is_retried_up_to_limit() {
        let body = json!({"error": {"message": "overloaded"}}).to_string();
        let (base_url, upstream) = spawn_upstream(503, &body).await;

        let result = client_for(&base_url, 2).complete("sys", &[], false).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(upstream.hits(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let body = json!({"error": {"message": "bad key"}}).to_string();
        let (base_url, upstream) = spawn_upstream(401, &body).await;

        let result = client_for(&base_url, 2).complete("sys", &[], false).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "bad key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_when_retries_disabled() {
        let body = json!({"error": {"message": "overloaded"}}).to_string();
        let (base_url, upstream) = spawn_upstream(503, &body).await;

        let result = client_for(&base_url, 0).complete("sys", &[], false).await;

        assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_retry_stops_when_budget_would_be_exceeded() {
        let body = json!({"error": {"message": "overloaded"}}).to_string();
        let (base_url, upstream) = spawn_upstream(503, &body).await;
        let mut client = client_for(&base_url, 5);
        client.retry.initial_backoff = Duration::from_millis(200);
        client.retry.max_elapsed = Duration::from_millis(50);

        let result = client.complete("sys", &[], false).await;

        assert!(matches!(result, Err(LlmError::Api { status: 503, .. })));
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_kept_verbatim() {
        let (base_url, _upstream) = spawn_upstream(500, "upstream exploded").await;

        let result = client_for(&base_url, 0).complete("sys", &[], false).await;

        match result {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tokio::time::{timeout, Duration};

use crate::config::EngineConfig;
use crate::llm::{LlmError, ReasoningService};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Reusable HTTP client singleton (created once, reused for all requests)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client")
    })
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

/// HTTP reasoning-service client speaking the messages API.
/// The API key is read from `ANTHROPIC_API_KEY`.
pub struct HttpReasoner {
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl HttpReasoner {
    pub fn from_config(config: &EngineConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| LlmError::Transport("ANTHROPIC_API_KEY not set".to_string()))?;
        Ok(HttpReasoner {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.request_timeout_secs,
        })
    }

    async fn post(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = get_http_client()
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to reach reasoning service: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Transport(format!(
                "reasoning service returned {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("failed to decode response: {e}")))?;

        let text = parsed
            .content
            .first()
            .map(|block| block.text.clone())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::Transport("empty completion".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ReasoningService for HttpReasoner {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let started = std::time::Instant::now();
        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            self.post(prompt, max_tokens),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.timeout_secs))?;

        match &result {
            Ok(text) => {
                tracing::info!(
                    model = %self.model,
                    latency_ms = started.elapsed().as_millis() as u64,
                    response_chars = text.len(),
                    "Reasoning call completed"
                );
            }
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "Reasoning call failed");
            }
        }
        result
    }
}

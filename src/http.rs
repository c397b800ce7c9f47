use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One call to the text-generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Generated text plus the token usage reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation service returned no content")]
    EmptyOutput,
}

/// The external text-generation collaborator.
///
/// `AppState` keeps an `Arc<dyn TextGenerator>`; production uses `HttpClient`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model id recorded on drafts produced by this generator
    fn model_name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI-compatible chat-completions client.
///
/// Cloning is cheap because reqwest::Client is reference counted. No retries:
/// a failed call surfaces to the requester, who can resubmit.
#[derive(Clone)]
pub struct HttpClient {
    pub conn: reqwest::Client,
    base_url: String,
    api_key: String,
    model_name: String,
}

impl HttpClient {
    pub fn new(
        conn: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for HttpClient {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let full_url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            model = %request.model,
            prompt_preview = %request.prompt.chars().take(100).collect::<String>(),
            "Sending generation request"
        );

        let response = self
            .conn
            .post(full_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyOutput)?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .map(|usage| (usage.prompt_tokens, usage.completion_tokens))
            .unwrap_or((0, 0));

        Ok(Generation {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }
}

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn, instrument};
use tracing_subscriber::{fmt, EnvFilter};
use backoff::{ExponentialBackoff, future::retry};
use std::time::Duration;

const MAX_RETRY_ELAPSED_SECS: u64 = 120;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which chat-completion backend to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
}

// --- Shared Logging ---

/// Initialize structured logging with JSON format in production (when RUST_LOG is set),
/// or pretty format for local development.
pub fn init_logging() {
    let is_production = std::env::var("RUST_LOG").is_ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if is_production {
        let _ = fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}

// --- OpenAI Structs ---

#[derive(Serialize, Debug)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub temperature: f64,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiChoiceMessage {
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiChoice {
    pub message: OpenAiChoiceMessage,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiResponse {
    pub choices: Option<Vec<OpenAiChoice>>,
    pub error: Option<OpenAiError>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiError {
    pub message: String,
}

// --- Gemini Structs ---

#[derive(Serialize, Deserialize, Debug)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

#[derive(Deserialize, Debug)]
pub struct GeminiResponse {
    pub candidates: Option<Vec<GeminiCandidate>>,
    pub error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiError {
    pub message: String,
}

/// Call the configured LLM provider with exponential backoff retry for transient failures
#[instrument(skip(client, api_key, prompt), fields(provider = ?provider, prompt_len = prompt.len()))]
pub async fn call_llm_with_retry(
    client: &reqwest::Client,
    provider: LlmProvider,
    api_key: &str,
    prompt: String,
) -> Result<String, BoxError> {
    let backoff = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(MAX_RETRY_ELAPSED_SECS)),
        ..Default::default()
    };

    let client = client.clone();
    let api_key = api_key.to_string();

    let result = retry(backoff, || {
        let client = client.clone();
        let api_key = api_key.clone();
        let prompt = prompt.clone();

        async move {
            let call = match provider {
                LlmProvider::OpenAI => call_openai(&client, &api_key, prompt).await,
                LlmProvider::Gemini => call_gemini(&client, &api_key, prompt).await,
            };
            match call {
                Ok(response) => Ok(response),
                Err(e) => {
                    let err_str = e.to_string();
                    // Retry on transient errors (network, rate limits, server errors)
                    if is_transient_error(&err_str) {
                        warn!(error = %err_str, "Transient LLM error, retrying");
                        Err(backoff::Error::transient(e))
                    } else {
                        error!(error = %err_str, "Permanent LLM error, not retrying");
                        Err(backoff::Error::permanent(e))
                    }
                }
            }
        }
    }).await?;

    Ok(result)
}

fn is_transient_error(err: &str) -> bool {
    let transient_patterns = [
        "timeout",
        "connection",
        "rate limit",
        "429",
        "500",
        "502",
        "503",
        "504",
        "temporarily",
        "overloaded",
    ];

    let err_lower = err.to_lowercase();
    transient_patterns.iter().any(|p| err_lower.contains(p))
}

async fn call_openai(client: &reqwest::Client, api_key: &str, text: String) -> Result<String, BoxError> {
    let base_url = std::env::var("OPENAI_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
    let model = std::env::var("OPENAI_MODEL")
        .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let request = OpenAiRequest {
        model,
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: text,
        }],
        temperature: 0.7,
    };

    debug!("Sending request to OpenAI API");

    let res = client.post(&url)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await?;

    let status = res.status();
    debug!(status = %status, "OpenAI API response received");

    if !status.is_success() {
        let error_body = res.text().await.unwrap_or_default();
        return Err(format!("OpenAI API returned {}: {}", status, error_body).into());
    }

    let resp: OpenAiResponse = res.json().await?;

    if let Some(error) = resp.error {
        return Err(format!("OpenAI API Error: {}", error.message).into());
    }

    if let Some(choices) = resp.choices {
        if let Some(first) = choices.first() {
            return Ok(first.message.content.clone());
        }
    }

    Err("No content returned from OpenAI".into())
}

async fn call_gemini(client: &reqwest::Client, api_key: &str, text: String) -> Result<String, BoxError> {
    let base_url = std::env::var("GEMINI_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
    let model = std::env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
    // Note: API key in URL is required by Gemini API - we redact it in logs
    let url = format!(
        "{}/v1beta/models/{}:generateContent?key={}",
        base_url.trim_end_matches('/'),
        model,
        api_key
    );

    let request = GeminiRequest {
        contents: vec![
            GeminiContent {
                parts: vec![ GeminiPart { text } ]
            }
        ]
    };

    debug!("Sending request to Gemini API");

    let res = client.post(&url)
        .json(&request)
        .send()
        .await?;

    let status = res.status();
    debug!(status = %status, "Gemini API response received");

    if !status.is_success() {
        let error_body = res.text().await.unwrap_or_default();
        return Err(format!("Gemini API returned {}: {}", status, error_body).into());
    }

    let resp: GeminiResponse = res.json().await?;

    if let Some(error) = resp.error {
        return Err(format!("Gemini API Error: {}", error.message).into());
    }

    if let Some(candidates) = resp.candidates {
        if let Some(first) = candidates.first() {
            if let Some(part) = first.content.parts.first() {
                return Ok(part.text.clone());
            }
        }
    }

    Err("No content returned from Gemini".into())
}

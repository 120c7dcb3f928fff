//! Remote completion client.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Maps a prompt to generated text.
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as the sole user message and return the reply text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// response without reply text.
    fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenRouter chat completions client.
///
/// One POST per call. No retries and no request timeout.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    endpoint: String,
    client: Client,
}

impl OpenRouterClient {
    /// Create a client posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS init failure).
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    /// The URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionClient for OpenRouterClient {
    fn complete(&self, api_key: &str, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(endpoint = %self.endpoint, model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()?
            .error_for_status()?;

        let body = response.text()?;
        parse_reply(&body)
    }
}

/// Extract `choices[0].message.content` from a response body.
///
/// # Errors
///
/// Returns an error if the body is not JSON of the expected shape.
pub fn parse_reply(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| Error::MalformedResponse("missing choices[0].message.content".to_string()))
}

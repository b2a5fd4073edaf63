//! OpenAI Assistants Provider
//!
//! Talks to the hosted Assistants HTTP API (v2). Every request carries the
//! bearer key, the assistants beta header and, when configured, the project
//! header.
//!
//! Reads (`GET`) are retried with exponential backoff. Writes (`POST`) are
//! sent once; a duplicated message or run would change what the assistant
//! answers.
//!
//! # Examples
//!
//! ```no_run
//! use assetlens_llm::OpenAiAssistants;
//!
//! let assistants = OpenAiAssistants::new("sk-...", "asst_123")
//!     .unwrap()
//!     .with_project("proj_456");
//! ```

use crate::{AssistantApi, LlmError, RunId, RunStatus, ThreadId};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts for read requests
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";
const PROJECT_HEADER: &str = "OpenAI-Project";

/// Client for the hosted Assistants API
pub struct OpenAiAssistants {
    base_url: String,
    api_key: String,
    assistant_id: String,
    project: Option<String>,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct NewMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct NewThread<'a> {
    messages: Vec<NewMessage<'a>>,
}

#[derive(Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
}

#[derive(Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Deserialize)]
struct RunResponse {
    status: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextValue>,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

impl MessageList {
    /// Text of the newest assistant message (list is newest first)
    fn latest_assistant_text(self) -> Option<String> {
        self.data
            .into_iter()
            .find(|message| message.role == "assistant")
            .map(|message| {
                message
                    .content
                    .into_iter()
                    .filter(|part| part.kind == "text")
                    .filter_map(|part| part.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|text| !text.is_empty())
    }
}

fn status_error(status: StatusCode, body: String) -> LlmError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(body),
        _ => LlmError::Communication(format!("HTTP {}: {}", status, body)),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    response
        .json::<T>()
        .await
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

impl OpenAiAssistants {
    /// Create a client for the given key and assistant
    pub fn new(
        api_key: impl Into<String>,
        assistant_id: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            project: None,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Scope requests to a project
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts for read requests
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE);
        match &self.project {
            Some(project) => request.header(PROJECT_HEADER, project),
            None => request,
        }
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, LlmError> {
        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LlmError> {
        let url = self.url(path);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.authorized(self.client.get(&url)).send().await {
                Ok(response) if response.status().is_success() => return decode(response).await,
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let error = status_error(status, body);
                    if status == StatusCode::NOT_FOUND {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!("GET {} failed, retrying in {:?}", path, delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistants {
    async fn create_thread(&self, seed_messages: &[String]) -> Result<ThreadId, LlmError> {
        let body = NewThread {
            messages: seed_messages
                .iter()
                .map(|content| NewMessage { role: "user", content })
                .collect(),
        };
        let created: IdResponse = self.post("/threads", &body).await?;
        debug!("Created thread {}", created.id);
        Ok(ThreadId(created.id))
    }

    async fn add_message(&self, thread: &ThreadId, content: &str) -> Result<(), LlmError> {
        let body = NewMessage { role: "user", content };
        let _: IdResponse = self.post(&format!("/threads/{}/messages", thread), &body).await?;
        Ok(())
    }

    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, LlmError> {
        let body = NewRun {
            assistant_id: &self.assistant_id,
        };
        let run: IdResponse = self.post(&format!("/threads/{}/runs", thread), &body).await?;
        Ok(RunId(run.id))
    }

    async fn run_status(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus, LlmError> {
        let response: RunResponse = self.get(&format!("/threads/{}/runs/{}", thread, run)).await?;
        Ok(RunStatus::parse(&response.status))
    }

    async fn run_reply(&self, thread: &ThreadId, run: &RunId) -> Result<Option<String>, LlmError> {
        let list: MessageList = self
            .get(&format!("/threads/{}/messages?run_id={}&order=desc", thread, run))
            .await?;
        Ok(list.latest_assistant_text())
    }

    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> Result<(), LlmError> {
        let _: IdResponse = self
            .post(&format!("/threads/{}/runs/{}/cancel", thread, run), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

//! assetlens Assistant Service Layer
//!
//! Transport for the conversational extraction service. The service keeps a
//! thread of messages; each query is answered by a *run* that is polled until
//! it reaches a terminal status.
//!
//! # Providers
//!
//! - [`MockAssistant`]: scripted responses for tests, no network
//! - [`OpenAiAssistants`]: the hosted Assistants HTTP API
//!
//! # Examples
//!
//! ```
//! use assetlens_llm::{AssistantApi, MockAssistant, RunStatus};
//!
//! # tokio_test::block_on(async {
//! let assistant = MockAssistant::new(r#"{"make": "Apple"}"#);
//! let thread = assistant.create_thread(&[]).await.unwrap();
//! assistant.add_message(&thread, "MacBook Air").await.unwrap();
//! let run = assistant.start_run(&thread).await.unwrap();
//! assert_eq!(assistant.run_status(&thread, &run).await.unwrap(), RunStatus::Completed);
//! # });
//! ```

#![warn(missing_docs)]

mod mock;
pub mod openai;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub use mock::MockAssistant;
pub use openai::OpenAiAssistants;

/// Errors that can occur while talking to the assistant service
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Assistant or model not available
    #[error("Assistant not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Identifier of a conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadId(pub String);

/// Identifier of a run on a thread
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Waiting to start
    Queued,
    /// Being processed
    InProgress,
    /// Waiting on tool output
    RequiresAction,
    /// Cancellation requested
    Cancelling,
    /// Finished successfully
    Completed,
    /// Finished without a full answer
    Incomplete,
    /// Failed
    Failed,
    /// Cancelled
    Cancelled,
    /// Expired before finishing
    Expired,
    /// A status this client does not know
    Unknown(String),
}

impl RunStatus {
    /// Parse the wire representation
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "completed" => RunStatus::Completed,
            "incomplete" => RunStatus::Incomplete,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            other => RunStatus::Unknown(other.to_string()),
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Unknown(s) => s,
        }
    }

    /// Whether the run ended without producing an answer
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired | RunStatus::Incomplete
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conversational assistant service
///
/// Implementations are transport only; sequencing and polling policy belong
/// to the caller.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create a thread seeded with the given user messages
    async fn create_thread(&self, seed_messages: &[String]) -> Result<ThreadId, LlmError>;

    /// Append a user message to a thread
    async fn add_message(&self, thread: &ThreadId, content: &str) -> Result<(), LlmError>;

    /// Start a run that answers the thread's latest messages
    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, LlmError>;

    /// Current status of a run
    async fn run_status(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus, LlmError>;

    /// Text of the latest assistant message produced by a run
    async fn run_reply(&self, thread: &ThreadId, run: &RunId) -> Result<Option<String>, LlmError>;

    /// Ask the service to stop a run
    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> Result<(), LlmError>;
}

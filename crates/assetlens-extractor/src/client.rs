//! Session-scoped extraction client

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::parser::parse_reply;
use crate::prompt::{query_prompt, seed_messages};
use crate::sleeper::{Sleeper, TokioSleeper};
use assetlens_domain::ExtractedAttributes;
use assetlens_llm::{AssistantApi, RunId, RunStatus, ThreadId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An open conversational context
///
/// Not `Clone`: [`ExtractionClient::extract`] borrows it mutably, so two
/// queries can never be in flight on the same session.
#[derive(Debug)]
pub struct SessionHandle {
    thread: ThreadId,
    queries: usize,
}

impl SessionHandle {
    /// Thread backing this session
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread
    }

    /// Number of queries submitted on this session
    pub fn queries(&self) -> usize {
        self.queries
    }
}

/// Where a single query is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunPhase {
    Submitted,
    Polling { attempt: u32 },
    Completed,
    TimedOut,
    Failed(RunStatus),
}

/// Submits inputs to the assistant service and waits for their results
pub struct ExtractionClient<A> {
    api: A,
    sleeper: Arc<dyn Sleeper>,
    config: ExtractorConfig,
}

impl<A: AssistantApi> ExtractionClient<A> {
    /// Create a client that waits on the tokio timer
    pub fn new(api: A, config: ExtractorConfig) -> Self {
        Self {
            api,
            sleeper: Arc::new(TokioSleeper),
            config,
        }
    }

    /// Replace the sleeper used between status checks
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Client configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Open a session seeded with the disambiguation instructions
    pub async fn open_session(&self) -> Result<SessionHandle, ExtractionError> {
        let thread = self
            .api
            .create_thread(&seed_messages())
            .await
            .map_err(|e| ExtractionError::SessionUnavailable(e.to_string()))?;

        info!("Opened extraction session {}", thread);
        Ok(SessionHandle { thread, queries: 0 })
    }

    /// Extract attributes from one input on an open session
    pub async fn extract(
        &self,
        session: &mut SessionHandle,
        input: &str,
    ) -> Result<ExtractedAttributes, ExtractionError> {
        self.api.add_message(&session.thread, &query_prompt(input)).await?;
        let run = self.api.start_run(&session.thread).await?;
        session.queries += 1;
        debug!("Started run {} for '{}'", run, input);

        let mut phase = RunPhase::Submitted;
        loop {
            phase = match phase {
                RunPhase::Submitted => self.check(session, &run, 0).await?,
                RunPhase::Polling { attempt } if attempt >= self.config.max_poll_attempts => {
                    RunPhase::TimedOut
                }
                RunPhase::Polling { attempt } => {
                    self.sleeper.sleep(self.config.poll_interval()).await;
                    self.check(session, &run, attempt + 1).await?
                }
                RunPhase::Completed => return self.collect(session, &run, input).await,
                RunPhase::TimedOut => {
                    if let Err(e) = self.api.cancel_run(&session.thread, &run).await {
                        warn!("Failed to cancel run {}: {}", run, e);
                    }
                    return Err(ExtractionError::Timeout {
                        run: run.to_string(),
                        input: input.to_string(),
                    });
                }
                RunPhase::Failed(status) => {
                    return Err(ExtractionError::RunFailed {
                        run: run.to_string(),
                        status,
                    })
                }
            };
        }
    }

    async fn check(
        &self,
        session: &SessionHandle,
        run: &RunId,
        attempt: u32,
    ) -> Result<RunPhase, ExtractionError> {
        let status = self.api.run_status(&session.thread, run).await?;
        debug!("Run {} is {} (attempt {})", run, status, attempt);

        Ok(match status {
            RunStatus::Completed => RunPhase::Completed,
            s if s.is_terminal_failure() => RunPhase::Failed(s),
            _ => RunPhase::Polling { attempt },
        })
    }

    async fn collect(
        &self,
        session: &SessionHandle,
        run: &RunId,
        input: &str,
    ) -> Result<ExtractedAttributes, ExtractionError> {
        let raw = self.api.run_reply(&session.thread, run).await?.unwrap_or_default();
        debug!("Run {} replied: {}", run, raw);
        parse_reply(&raw, input, self.config.normalize_model)
    }
}

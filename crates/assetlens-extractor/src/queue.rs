//! Single-owner request queue in front of one session

use crate::client::ExtractionClient;
use crate::error::ExtractionError;
use assetlens_domain::ExtractedAttributes;
use assetlens_llm::AssistantApi;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const QUEUE_DEPTH: usize = 64;

type Reply = oneshot::Sender<Result<ExtractedAttributes, ExtractionError>>;

struct Job {
    input: String,
    reply: Reply,
}

/// Serializes extraction requests through one worker task
///
/// The worker owns the client and its session; callers only hold the
/// sending side, so requests run strictly one after another.
pub struct ExtractionQueue {
    sender: mpsc::Sender<Job>,
    worker: JoinHandle<usize>,
}

impl ExtractionQueue {
    /// Open a session and start the worker
    ///
    /// Fails if the session cannot be opened.
    pub async fn start<A>(client: ExtractionClient<A>) -> Result<Self, ExtractionError>
    where
        A: AssistantApi + 'static,
    {
        let mut session = client.open_session().await?;
        let (sender, mut receiver) = mpsc::channel::<Job>(QUEUE_DEPTH);

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let result = client.extract(&mut session, &job.input).await;
                if job.reply.send(result).is_err() {
                    warn!("Caller went away before extraction of '{}' finished", job.input);
                }
            }
            debug!("Extraction worker stopping after {} queries", session.queries());
            session.queries()
        });

        Ok(Self { sender, worker })
    }

    /// Submit one input and wait for its result
    pub async fn extract(
        &self,
        input: impl Into<String>,
    ) -> Result<ExtractedAttributes, ExtractionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Job {
                input: input.into(),
                reply,
            })
            .await
            .map_err(|_| {
                ExtractionError::SessionUnavailable("extraction worker stopped".to_string())
            })?;

        response
            .await
            .map_err(|_| {
                ExtractionError::SessionUnavailable(
                    "extraction worker dropped the request".to_string(),
                )
            })?
    }

    /// Stop accepting requests and wait for the worker to drain
    ///
    /// Returns the number of queries the session handled.
    pub async fn shutdown(self) -> usize {
        drop(self.sender);
        self.worker.await.unwrap_or_else(|e| {
            warn!("Extraction worker ended abnormally: {}", e);
            0
        })
    }
}

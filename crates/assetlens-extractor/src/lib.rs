//! assetlens Extractor
//!
//! Turns free-text model descriptions into structured attributes by asking a
//! conversational assistant.
//!
//! # Architecture
//!
//! ```text
//! input → ExtractionQueue → (worker) ExtractionClient → AssistantApi
//!                                     │
//!                          Submitted → Polling → Completed | TimedOut | Failed
//! ```
//!
//! One session is seeded once with the disambiguation instructions and then
//! reused for every query. The session handle is owned by a single worker
//! task, so queries never overlap.
//!
//! # Example Usage
//!
//! ```
//! use assetlens_extractor::{ExtractionClient, ExtractionQueue, ExtractorConfig, InstantSleeper};
//! use assetlens_llm::MockAssistant;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let assistant = MockAssistant::new(r#"{"make": "Apple", "memory": "16GB"}"#);
//! let client = ExtractionClient::new(assistant, ExtractorConfig::default())
//!     .with_sleeper(Arc::new(InstantSleeper::new()));
//!
//! let queue = ExtractionQueue::start(client).await.unwrap();
//! let extracted = queue.extract("MacBook Air M2 16GB").await.unwrap();
//! assert_eq!(extracted.make(), Some("Apple"));
//! # });
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod parser;
mod prompt;
mod queue;
mod sleeper;

pub use client::{ExtractionClient, SessionHandle};
pub use config::ExtractorConfig;
pub use error::ExtractionError;
pub use parser::{first_json_object, parse_reply};
pub use prompt::{query_prompt, seed_messages, SEED_INSTRUCTIONS};
pub use queue::ExtractionQueue;
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper};

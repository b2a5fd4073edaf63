//! Scripted assistant for deterministic tests

use crate::{AssistantApi, LlmError, RunId, RunStatus, ThreadId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// How a run for a matching message behaves
#[derive(Debug, Clone)]
enum Script {
    /// Complete after `pending_polls` in-progress answers, then reply
    Reply { text: String, pending_polls: usize },
    /// Never leave `in_progress`
    Stall,
    /// End with a terminal failure status
    End(RunStatus),
    /// Fail to start the run
    StartError,
}

#[derive(Debug)]
struct RunState {
    script: Script,
    polls: usize,
    open: bool,
}

#[derive(Debug, Default)]
struct MockState {
    default_reply: String,
    scripts: Vec<(String, Script)>,
    fail_threads: bool,
    threads: usize,
    messages: Vec<(ThreadId, String)>,
    runs: HashMap<RunId, RunState>,
    run_count: usize,
    status_checks: usize,
    cancelled: Vec<RunId>,
    active_runs: usize,
    max_active_runs: usize,
}

/// Mock assistant that answers without any network calls
///
/// Runs are scripted by matching the latest message on the thread against
/// registered keys (substring match, first registered wins). Unmatched
/// messages complete immediately with the default reply.
///
/// Clones share state, so a test can keep a handle while the client owns
/// another.
///
/// # Examples
///
/// ```
/// use assetlens_llm::MockAssistant;
///
/// let mut assistant = MockAssistant::new("{}");
/// assistant.add_reply("Latitude", r#"{"make": "Dell"}"#);
/// assistant.add_stall("mystery box");
/// assert_eq!(assistant.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockAssistant {
    state: Arc<Mutex<MockState>>,
}

impl MockAssistant {
    /// Create a mock with a fixed default reply
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                default_reply: default_reply.into(),
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reply with `text` to messages containing `key`
    pub fn add_reply(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.add_delayed_reply(key, text, 0);
    }

    /// Reply with `text` after `pending_polls` in-progress status checks
    pub fn add_delayed_reply(
        &mut self,
        key: impl Into<String>,
        text: impl Into<String>,
        pending_polls: usize,
    ) {
        self.state().scripts.push((
            key.into(),
            Script::Reply {
                text: text.into(),
                pending_polls,
            },
        ));
    }

    /// Keep runs for messages containing `key` in progress forever
    pub fn add_stall(&mut self, key: impl Into<String>) {
        self.state().scripts.push((key.into(), Script::Stall));
    }

    /// End runs for messages containing `key` with the given status
    pub fn add_terminal_status(&mut self, key: impl Into<String>, status: RunStatus) {
        self.state().scripts.push((key.into(), Script::End(status)));
    }

    /// Refuse to start runs for messages containing `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.state().scripts.push((key.into(), Script::StartError));
    }

    /// Make thread creation fail
    pub fn fail_thread_creation(&mut self) {
        self.state().fail_threads = true;
    }

    /// Number of runs started
    pub fn call_count(&self) -> usize {
        self.state().run_count
    }

    /// Number of threads created
    pub fn thread_count(&self) -> usize {
        self.state().threads
    }

    /// Number of status checks made
    pub fn status_checks(&self) -> usize {
        self.state().status_checks
    }

    /// All messages posted, in order, including thread seeds
    pub fn messages(&self) -> Vec<(ThreadId, String)> {
        self.state().messages.clone()
    }

    /// Runs that were cancelled
    pub fn cancelled_runs(&self) -> Vec<RunId> {
        self.state().cancelled.clone()
    }

    /// Highest number of runs that were open at the same time
    pub fn max_active_runs(&self) -> usize {
        self.state().max_active_runs
    }

    fn close_run(state: &mut MockState, run: &RunId) {
        if let Some(run_state) = state.runs.get_mut(run) {
            if run_state.open {
                run_state.open = false;
                state.active_runs -= 1;
            }
        }
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl AssistantApi for MockAssistant {
    async fn create_thread(&self, seed_messages: &[String]) -> Result<ThreadId, LlmError> {
        let mut state = self.state();
        if state.fail_threads {
            return Err(LlmError::Communication("Mock thread creation failure".to_string()));
        }
        state.threads += 1;
        let thread = ThreadId(format!("thread_{}", state.threads));
        for message in seed_messages {
            state.messages.push((thread.clone(), message.clone()));
        }
        Ok(thread)
    }

    async fn add_message(&self, thread: &ThreadId, content: &str) -> Result<(), LlmError> {
        self.state().messages.push((thread.clone(), content.to_string()));
        Ok(())
    }

    async fn start_run(&self, thread: &ThreadId) -> Result<RunId, LlmError> {
        let mut state = self.state();
        let latest = state
            .messages
            .iter()
            .rev()
            .find(|(t, _)| t == thread)
            .map(|(_, m)| m.clone())
            .unwrap_or_default();

        let script = state
            .scripts
            .iter()
            .find(|(key, _)| latest.contains(key.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| Script::Reply {
                text: state.default_reply.clone(),
                pending_polls: 0,
            });

        if let Script::StartError = script {
            return Err(LlmError::Other("Mock error".to_string()));
        }

        state.run_count += 1;
        let run = RunId(format!("run_{}", state.run_count));
        state.runs.insert(
            run.clone(),
            RunState {
                script,
                polls: 0,
                open: true,
            },
        );
        state.active_runs += 1;
        state.max_active_runs = state.max_active_runs.max(state.active_runs);
        Ok(run)
    }

    async fn run_status(&self, _thread: &ThreadId, run: &RunId) -> Result<RunStatus, LlmError> {
        let mut state = self.state();
        state.status_checks += 1;

        let run_state = state
            .runs
            .get_mut(run)
            .ok_or_else(|| LlmError::InvalidResponse(format!("Unknown run {}", run)))?;
        run_state.polls += 1;

        let status = match &run_state.script {
            Script::Reply { pending_polls, .. } if run_state.polls > *pending_polls => {
                RunStatus::Completed
            }
            Script::Reply { .. } | Script::Stall => RunStatus::InProgress,
            Script::End(status) => status.clone(),
            Script::StartError => RunStatus::Failed,
        };

        if status.is_terminal_failure() {
            Self::close_run(&mut state, run);
        }
        Ok(status)
    }

    async fn run_reply(&self, _thread: &ThreadId, run: &RunId) -> Result<Option<String>, LlmError> {
        let mut state = self.state();
        let reply = match state.runs.get(run).map(|r| &r.script) {
            Some(Script::Reply { text, .. }) => Some(text.clone()),
            _ => None,
        };
        Self::close_run(&mut state, run);
        Ok(reply)
    }

    async fn cancel_run(&self, _thread: &ThreadId, run: &RunId) -> Result<(), LlmError> {
        let mut state = self.state();
        state.cancelled.push(run.clone());
        Self::close_run(&mut state, run);
        Ok(())
    }
}

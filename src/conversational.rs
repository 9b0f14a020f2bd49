//! Conversational fallback
//!
//! Handles messages that arrive outside the guided loan flow.
//! Routes them to the completion service under a hard deadline and
//! substitutes a fixed reply whenever that call does not succeed.

use crate::completion::{CompletionError, CompletionService};
use crate::config::DEFAULT_COMPLETION_TIMEOUT;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const SYSTEM_PROMPT: &str = "You are a loan assistant. \
Do NOT calculate EMI or eligibility. \
Only guide the user politely.";

pub const FALLBACK_REPLY: &str = "Please continue with the loan details.";

/// Never-failing wrapper around a completion service
#[derive(Clone)]
pub struct FallbackResponder {
    service: Arc<dyn CompletionService>,
    timeout: Duration,
}

impl FallbackResponder {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reply to a free-form message. Always returns text.
    pub async fn respond(&self, user_message: &str) -> String {
        match self.try_respond(user_message).await {
            Ok(answer) => {
                info!("Conversational reply from completion service");
                answer
            }
            Err(e) => {
                warn!(kind = ?e.kind, "Completion failed, using fallback reply: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn try_respond(&self, user_message: &str) -> Result<String, CompletionError> {
        // Dropping the future on timeout abandons the in-flight request.
        tokio::time::timeout(
            self.timeout,
            self.service.complete(SYSTEM_PROMPT, user_message),
        )
        .await
        .map_err(|_| CompletionError::timeout(self.timeout))?
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted completion service for tests
    pub enum FakeCompletion {
        Answer(String),
        Fail(CompletionError),
        Hang,
    }

    pub struct RecordingCompletion {
        pub behavior: FakeCompletion,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingCompletion {
        pub fn new(behavior: FakeCompletion) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn answering(text: &str) -> Arc<Self> {
            Self::new(FakeCompletion::Answer(text.to_string()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionService for RecordingCompletion {
        async fn complete(
            &self,
            system_prompt: &str,
            user_message: &str,
        ) -> Result<String, CompletionError> {
            self.calls
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_message.to_string()));

            match &self.behavior {
                FakeCompletion::Answer(text) => Ok(text.clone()),
                FakeCompletion::Fail(err) => Err(CompletionError::new(err.kind, err.message.clone())),
                FakeCompletion::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("too late".to_string())
                }
            }
        }
    }
}

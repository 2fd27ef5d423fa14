//! Scripted brain implementation - replays canned results in order.

use std::collections::VecDeque;
use std::sync::Mutex;

use brain_core::{async_trait, Brain, BrainError, GenerationRequest};

/// A brain that returns queued results in order and records every request.
///
/// When the queue runs dry the last result is repeated; an empty script
/// answers with `EmptyResponse`.
#[derive(Debug)]
pub struct ScriptedBrain {
    name: String,
    script: Mutex<VecDeque<Result<String, BrainError>>>,
    last: Mutex<Option<String>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBrain {
    /// Create an empty script with the given provider name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn fail(self, error: BrainError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, result: Result<String, BrainError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Copies of every request received, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, BrainError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match next {
            Some(Ok(text)) => {
                *last = Some(text.clone());
                Ok(text)
            }
            Some(Err(error)) => Err(error),
            None => last.clone().ok_or(BrainError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Failing brain implementation - always returns an error.

use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, GenerationRequest};

/// Which error a [`FailingBrain`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Timeout,
    Network,
    Server,
    Unauthorized,
    Empty,
}

impl FailureKind {
    fn to_error(self) -> BrainError {
        match self {
            Self::RateLimited => BrainError::RateLimited("quota exceeded".to_string()),
            Self::Timeout => BrainError::Timeout,
            Self::Network => BrainError::Network("connection refused".to_string()),
            Self::Server => BrainError::Api {
                status: 500,
                message: "internal error".to_string(),
            },
            Self::Unauthorized => BrainError::Api {
                status: 401,
                message: "invalid api key".to_string(),
            },
            Self::Empty => BrainError::EmptyResponse,
        }
    }
}

/// A brain that fails every call with the same error kind.
#[derive(Debug)]
pub struct FailingBrain {
    name: String,
    kind: FailureKind,
    calls: AtomicUsize,
}

impl FailingBrain {
    /// Create a failing brain with the given name and failure kind.
    pub fn new(name: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            name: name.into(),
            kind,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.kind.to_error())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

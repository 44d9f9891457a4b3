use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::application::CompletionClient;
use crate::domain::{CompletionRequest, Credential, RequestError, Turn};

/// Offline stand-in for a real provider: echoes the user text back with
/// sequential ids (`mock-1`, `mock-2`, ...).
pub struct MockCompletionClient {
    counter: AtomicU64,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Turn, RequestError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Mock completion #{} (parent={:?})",
            n,
            request.parent_message_id()
        );
        Ok(Turn::assistant(
            format!("echo: {}", request.text()),
            Some(format!("mock-{}", n)),
        ))
    }

    fn default_model(&self) -> &str {
        "mock"
    }
}

use async_trait::async_trait;

use crate::domain::{CompletionRequest, Credential, RequestError, Turn};

/// Sends one user message to a language-model provider and returns its reply.
///
/// Implementors own transport, serialization and whatever provider-side
/// bookkeeping is needed to honor `parentMessageId`. A successful call yields an
/// assistant [`Turn`] carrying the provider-assigned id.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Turn, RequestError>;

    /// Model used when a request carries no override.
    fn default_model(&self) -> &str;
}

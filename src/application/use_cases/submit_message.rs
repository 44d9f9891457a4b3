use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::application::CompletionClient;
use crate::domain::{
    ChatSession, CompletionRequest, Credential, DomainError, RequestError, Submission, Turn,
};

/// Session shared between a front-end and the task answering it.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Upper bound on one provider call, on top of any client-side timeout.
pub const DEFAULT_SUBMIT_DEADLINE: Duration = Duration::from_secs(120);

/// Runs one user turn through the completion client:
/// append user turn, set loading, call, append reply or error, clear loading.
///
/// The session lock is released while the provider call is outstanding, so a
/// concurrent submission observes the pending state and gets
/// [`DomainError::Busy`] rather than queueing.
///
/// The call and the final `finish` run in a spawned task. Dropping the
/// `execute` future (a disconnected HTTP client, say) does not abandon the
/// submission: the reply or error is still appended and loading cleared.
pub struct SubmitMessageUseCase {
    client: Arc<dyn CompletionClient>,
    deadline: Duration,
}

impl SubmitMessageUseCase {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            deadline: DEFAULT_SUBMIT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the turn that was appended for the reply. Provider failures are
    /// not errors here: they come back as an error-carrying turn.
    pub async fn execute(
        &self,
        session: &SharedSession,
        credential: &Credential,
        text: &str,
    ) -> Result<Turn, DomainError> {
        let submission = session.lock().await.begin(text)?;

        info!(
            "Submitting message (parent={}, model={})",
            submission.request().parent_message_id().unwrap_or("none"),
            submission
                .request()
                .model()
                .map(|m| m.as_str())
                .unwrap_or_else(|| self.client.default_model()),
        );

        let task = tokio::spawn(Self::answer(
            self.client.clone(),
            session.clone(),
            credential.clone(),
            submission,
            self.deadline,
        ));

        task.await
            .map_err(|e| DomainError::internal(format!("submission task failed: {e}")))?
    }

    async fn answer(
        client: Arc<dyn CompletionClient>,
        session: SharedSession,
        credential: Credential,
        submission: Submission,
        deadline: Duration,
    ) -> Result<Turn, DomainError> {
        let outcome = match tokio::time::timeout(
            deadline,
            client.complete(&credential, submission.request()),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(RequestError::network(format!(
                "no reply within {}s",
                deadline.as_secs_f32()
            ))),
        };
        if let Err(e) = &outcome {
            warn!("Completion failed: {}", e);
        }

        let mut guard = session.lock().await;
        match guard.finish(submission.ticket(), outcome) {
            Ok(turn) => Ok(turn.clone()),
            Err(e) => {
                if e.is_stale() {
                    warn!(
                        "Discarding reply to superseded submission #{}",
                        submission.ticket()
                    );
                }
                Err(e)
            }
        }
    }

    /// One completion outside any session, with the caller supplying the parent id.
    pub async fn execute_detached(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Turn, DomainError> {
        let outcome = tokio::time::timeout(self.deadline, self.client.complete(credential, request))
            .await
            .map_err(|_| RequestError::network("no reply before the deadline"))?;
        Ok(outcome?)
    }
}

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{CompletionParams, CompletionRequest, Conversation, ErrorInfo, Turn};
use crate::domain::{DomainError, RequestError};

/// A submission that has been recorded but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    ticket: u64,
    request: CompletionRequest,
}

impl Submission {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn request(&self) -> &CompletionRequest {
        &self.request
    }
}

/// Everything one chat user owns: the conversation, their completion
/// settings and the bookkeeping for the single in-flight request.
///
/// Created when a chat starts and dropped when it ends; nothing outlives it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    id: String,
    conversation: Conversation,
    completion_params: Option<CompletionParams>,
    #[serde(skip)]
    pending: Option<u64>,
    #[serde(skip)]
    next_ticket: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation: Conversation::new(),
            completion_params: None,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn completion_params(&self) -> Option<&CompletionParams> {
        self.completion_params.as_ref()
    }

    pub fn set_completion_params(&mut self, params: Option<CompletionParams>) {
        self.completion_params = params;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records the user turn and marks the session as waiting on `request`.
    ///
    /// The parent id is taken from the conversation before the user turn is
    /// appended. Fails with [`DomainError::Busy`] while another submission is
    /// outstanding, leaving the conversation untouched.
    pub fn begin(&mut self, text: &str) -> Result<Submission, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::invalid_input("Message text must not be empty"));
        }
        if self.pending.is_some() {
            return Err(DomainError::Busy);
        }

        let mut request = CompletionRequest::new(text);
        if let Some(parent) = self.conversation.last_message_id() {
            request = request.with_parent_message_id(parent);
        }
        if let Some(params) = &self.completion_params {
            request = request.with_completion_params(params.clone());
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(ticket);

        self.conversation.append_user(text);
        self.conversation.set_loading(true);

        debug!("Session {} began submission #{}", self.id, ticket);
        Ok(Submission { ticket, request })
    }

    /// Applies the outcome of submission `ticket`.
    ///
    /// Failures become an error turn in the assistant slot. A ticket that is no
    /// longer the pending one (the session was reset meanwhile) is rejected
    /// with [`DomainError::StaleResponse`] and nothing is appended.
    pub fn finish(
        &mut self,
        ticket: u64,
        outcome: Result<Turn, RequestError>,
    ) -> Result<&Turn, DomainError> {
        if self.pending != Some(ticket) {
            return Err(DomainError::StaleResponse);
        }

        self.pending = None;
        self.conversation.set_loading(false);

        debug!("Session {} finished submission #{}", self.id, ticket);
        Ok(match outcome {
            Ok(turn) => self.conversation.append_assistant(turn),
            Err(err) => self.conversation.append_error(ErrorInfo::from(&err)),
        })
    }

    /// Starts over with an empty conversation. Completion settings survive;
    /// a response still in flight will be treated as stale.
    pub fn reset(&mut self) {
        self.conversation = Conversation::new();
        self.pending = None;
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompletionModel, Side};

    #[test]
    fn test_begin_on_empty_conversation_has_no_parent() {
        let mut session = ChatSession::new();
        let submission = session.begin("hello").unwrap();

        assert_eq!(submission.request().text(), "hello");
        assert!(submission.request().parent_message_id().is_none());
        assert!(session.conversation().is_loading());
        assert_eq!(session.conversation().len(), 1);
    }

    #[test]
    fn test_parent_id_threads_from_last_reply() {
        let mut session = ChatSession::new();
        let first = session.begin("hello").unwrap();
        session
            .finish(first.ticket(), Ok(Turn::assistant("hi there", Some("abc".into()))))
            .unwrap();

        let second = session.begin("how are you").unwrap();
        assert_eq!(second.request().parent_message_id(), Some("abc"));
    }

    #[test]
    fn test_second_begin_while_pending_is_busy() {
        let mut session = ChatSession::new();
        session.begin("one").unwrap();

        let err = session.begin("two").unwrap_err();
        assert!(err.is_busy());
        assert_eq!(session.conversation().len(), 1);
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let mut session = ChatSession::new();
        assert!(session.begin("  \n").unwrap_err().is_invalid_input());
        assert!(session.conversation().is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn test_failure_appends_error_turn_and_clears_loading() {
        let mut session = ChatSession::new();
        let submission = session.begin("hello").unwrap();
        let turn = session
            .finish(submission.ticket(), Err(RequestError::network("timeout")))
            .unwrap();

        assert_eq!(turn.side(), Side::Assistant);
        assert!(turn.is_error());
        assert!(!session.conversation().is_loading());
        assert_eq!(session.conversation().len(), 2);
    }

    #[test]
    fn test_result_after_reset_is_stale() {
        let mut session = ChatSession::new();
        let submission = session.begin("hello").unwrap();
        session.reset();

        let err = session
            .finish(submission.ticket(), Ok(Turn::assistant("late", None)))
            .unwrap_err();
        assert!(err.is_stale());
        assert!(session.conversation().is_empty());

        // A fresh submission after the reset is accepted.
        let next = session.begin("again").unwrap();
        assert!(next.ticket() > submission.ticket());
    }

    #[test]
    fn test_completion_params_ride_along() {
        let mut session = ChatSession::new();
        session.set_completion_params(Some(CompletionParams::with_model(CompletionModel::Gpt4)));

        let submission = session.begin("hello").unwrap();
        assert_eq!(submission.request().model(), Some(CompletionModel::Gpt4));
    }
}

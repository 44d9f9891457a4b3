use serde::Serialize;

use crate::domain::{ChatSession, ErrorInfo, Side};

pub const PRIVACY_NOTICE: &str =
    "This page sends your messages to OpenAI. Mind the privacy risk and do not send unlawful content.";
pub const WELCOME_MESSAGE: &str = "Hello! How can I help you?";
pub const LOADING_MESSAGE: &str = "Thinking hard...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Notice,
    Welcome,
    Message,
    Loading,
}

/// One line of the rendered conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub side: Side,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl TranscriptEntry {
    fn fixed(kind: EntryKind, side: Side, text: &str) -> Self {
        Self {
            kind,
            side,
            text: text.to_string(),
            id: None,
            error: None,
        }
    }
}

/// Turns a session into the entry list every surface displays: the privacy
/// notice, the greeting, the conversation, and a placeholder while loading.
///
/// Reads the session only; rendering the same state twice yields the same entries.
pub struct RenderTranscriptUseCase {
    notice: String,
    welcome: String,
}

impl RenderTranscriptUseCase {
    pub fn new() -> Self {
        Self {
            notice: PRIVACY_NOTICE.to_string(),
            welcome: WELCOME_MESSAGE.to_string(),
        }
    }

    pub fn with_welcome(mut self, welcome: impl Into<String>) -> Self {
        self.welcome = welcome.into();
        self
    }

    pub fn execute(&self, session: &ChatSession) -> Vec<TranscriptEntry> {
        let conversation = session.conversation();
        let mut entries = Vec::with_capacity(conversation.len() + 3);

        entries.push(TranscriptEntry::fixed(EntryKind::Notice, Side::System, &self.notice));
        entries.push(TranscriptEntry::fixed(
            EntryKind::Welcome,
            Side::Assistant,
            &self.welcome,
        ));

        entries.extend(conversation.turns().iter().map(|turn| TranscriptEntry {
            kind: EntryKind::Message,
            side: turn.side(),
            text: turn.text().to_string(),
            id: turn.id().map(str::to_string),
            error: turn.error().cloned(),
        }));

        if conversation.is_loading() {
            entries.push(TranscriptEntry::fixed(
                EntryKind::Loading,
                Side::Assistant,
                LOADING_MESSAGE,
            ));
        }

        entries
    }
}

impl Default for RenderTranscriptUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RequestError, Turn};

    #[test]
    fn test_empty_session_shows_notice_and_welcome() {
        let entries = RenderTranscriptUseCase::new().execute(&ChatSession::new());

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Notice);
        assert_eq!(entries[1].text, WELCOME_MESSAGE);
    }

    #[test]
    fn test_loading_placeholder_follows_pending_user_turn() {
        let mut session = ChatSession::new();
        session.begin("hello").unwrap();

        let entries = RenderTranscriptUseCase::new().execute(&session);
        let last = entries.last().unwrap();
        assert_eq!(last.kind, EntryKind::Loading);
        assert_eq!(entries[entries.len() - 2].text, "hello");
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut session = ChatSession::new();
        let first = session.begin("hello").unwrap();
        session
            .finish(first.ticket(), Ok(Turn::assistant("hi", Some("abc".into()))))
            .unwrap();
        let second = session.begin("again").unwrap();
        session
            .finish(second.ticket(), Err(RequestError::network("down")))
            .unwrap();

        let renderer = RenderTranscriptUseCase::new();
        let once = renderer.execute(&session);
        let twice = renderer.execute(&session);

        assert_eq!(once, twice);
        assert_eq!(session.conversation().len(), 4);
        assert!(once.last().unwrap().error.is_some());
    }

    #[test]
    fn test_custom_welcome() {
        let entries = RenderTranscriptUseCase::new()
            .with_welcome("Ready.")
            .execute(&ChatSession::new());
        assert_eq!(entries[1].text, "Ready.");
    }
}

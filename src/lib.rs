pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    CompletionClient, EntryKind, RenderTranscriptUseCase, SubmitMessageUseCase, TranscriptEntry,
};

pub use cli::Commands;

pub use connector::{
    MockCompletionClient, OpenAiCompletionClient, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};

pub use domain::{
    ChatSession, CompletionModel, CompletionParams, CompletionRequest, Conversation, Credential,
    DomainError, ErrorInfo, RequestError, Side, Submission, Turn,
};

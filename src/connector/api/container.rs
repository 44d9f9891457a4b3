use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::application::{CompletionClient, RenderTranscriptUseCase, SubmitMessageUseCase};
use crate::connector::adapter::web::{SessionRegistry, WebState};
use crate::connector::adapter::{
    MockCompletionClient, OpenAiCompletionClient, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
use crate::domain::{CompletionModel, Credential, DomainError};

/// Settings gathered from the command line. Unset values fall back to the
/// `OPENAI_*` environment variables, then to built-in defaults.
#[derive(Debug, Default)]
pub struct ContainerConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Answer locally with [`MockCompletionClient`] instead of calling a provider.
    pub mock: bool,
}

pub struct Container {
    client: Arc<dyn CompletionClient>,
    credential: Option<Credential>,
    base_url: String,
    deadline: Duration,
    mock: bool,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = config
            .model
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let mut credential = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .and_then(Credential::new);

        let client: Arc<dyn CompletionClient> = if config.mock {
            debug!("Using mock completion client");
            // The mock never looks at the key.
            credential = credential.or_else(|| Credential::new("mock"));
            Arc::new(MockCompletionClient::new())
        } else {
            debug!("Using completion endpoint {} (model {})", base_url, model);
            if CompletionModel::from_str(&model).is_err() {
                warn!(
                    "Default model {} is not a known model; /model and the chat API only accept: {}",
                    model,
                    CompletionModel::ALL.map(|m| m.as_str()).join(", ")
                );
            }
            Arc::new(OpenAiCompletionClient::new(model, base_url.clone(), timeout)?)
        };

        Ok(Self {
            client,
            credential,
            base_url,
            // The client's own timeout fires first; this only catches a hung call.
            deadline: timeout + Duration::from_secs(5),
            mock: config.mock,
        })
    }

    pub fn submit_use_case(&self) -> SubmitMessageUseCase {
        SubmitMessageUseCase::new(self.client.clone()).with_deadline(self.deadline)
    }

    pub fn render_use_case(&self) -> RenderTranscriptUseCase {
        RenderTranscriptUseCase::new()
    }

    pub fn web_state(&self) -> WebState {
        WebState::from_parts(
            self.submit_use_case(),
            self.render_use_case(),
            SessionRegistry::new(),
        )
    }

    /// Key for terminal sessions. The web surface reads its key from a cookie instead.
    pub fn credential(&self) -> Result<&Credential, DomainError> {
        self.credential.as_ref().ok_or(DomainError::MissingCredential)
    }

    pub fn model(&self) -> &str {
        self.client.default_model()
    }

    /// Whether the default model is one of [`CompletionModel::ALL`]. The mock
    /// client has no real model and counts as listed.
    pub fn model_is_listed(&self) -> bool {
        self.mock || CompletionModel::from_str(self.model()).is_ok()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }
}

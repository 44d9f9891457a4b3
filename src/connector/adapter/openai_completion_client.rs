use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::CompletionClient;
use crate::domain::{CompletionRequest, Credential, DomainError, RequestError, Side, Turn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Messages kept for parent-id threading before the oldest are forgotten.
pub const DEFAULT_HISTORY_LIMIT: usize = 10_000;
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

const SYSTEM_PROMPT: &str = "\
You are ChatGPT, a large language model trained by OpenAI. \
Answer as concisely as possible.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage],
}

/// Subset of the Chat Completions response we read.
#[derive(Deserialize)]
struct ApiResponse {
    id: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    side: Side,
    text: String,
    parent: Option<String>,
}

/// Remembered messages, keyed by id. Holds at most `capacity`, forgetting
/// the oldest first.
#[derive(Debug)]
struct MessageStore {
    messages: HashMap<String, StoredMessage>,
    order: VecDeque<String>,
    capacity: usize,
}

impl MessageStore {
    fn new(capacity: usize) -> Self {
        Self {
            messages: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(2),
        }
    }

    fn get(&self, id: &str) -> Option<&StoredMessage> {
        self.messages.get(id)
    }

    fn len(&self) -> usize {
        self.messages.len()
    }

    fn insert(&mut self, id: String, message: StoredMessage) {
        if self.messages.insert(id.clone(), message).is_none() {
            self.order.push_back(id);
        }
        while self.messages.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.messages.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// [`CompletionClient`] for the OpenAI Chat Completions API and compatible servers.
///
/// The API itself is stateless, so the client remembers every message it has
/// sent or received, keyed by id, each pointing at its parent. A request with a
/// `parentMessageId` replays that chain as context; an unknown parent starts a
/// fresh chain. The whole remembered chain is sent, with no windowing. Only the
/// most recent [`DEFAULT_HISTORY_LIMIT`] messages are kept (see
/// [`Self::with_history_limit`]); older context is silently dropped.
///
/// Configuration comes from the constructor or, via [`Self::from_env`]:
///
/// | Variable          | Default                  |
/// |-------------------|--------------------------|
/// | `OPENAI_BASE_URL` | `https://api.openai.com` |
/// | `OPENAI_MODEL`    | `gpt-3.5-turbo`          |
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    model: String,
    url: String,
    messages: Arc<Mutex<MessageStore>>,
}

impl OpenAiCompletionClient {
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let base: String = base_url.into();
        let url = format!("{}{}", base.trim_end_matches('/'), COMPLETIONS_PATH);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            model: model.into(),
            url,
            messages: Arc::new(Mutex::new(MessageStore::new(DEFAULT_HISTORY_LIMIT))),
        })
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.messages = Arc::new(Mutex::new(MessageStore::new(limit)));
        self
    }

    pub fn from_env() -> Result<Self, DomainError> {
        let base =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(model, base, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of messages remembered for parent-id threading.
    pub async fn remembered(&self) -> usize {
        self.messages.lock().await.len()
    }

    /// System prompt, then the stored chain ending at `parent` (oldest first),
    /// then the new user text.
    fn build_prompt(store: &MessageStore, parent: Option<&str>, text: &str) -> Vec<ApiMessage> {
        let mut chain = Vec::new();
        let mut cursor = parent;
        // A well-formed chain can't be longer than the store; this bounds cycles.
        while let Some(id) = cursor {
            if chain.len() >= store.len() {
                break;
            }
            match store.get(id) {
                Some(message) => {
                    chain.push(ApiMessage {
                        role: message.side.as_str(),
                        content: message.text.clone(),
                    });
                    cursor = message.parent.as_deref();
                }
                None => {
                    debug!("Parent message {} not remembered; chain ends here", id);
                    break;
                }
            }
        }
        chain.reverse();

        let mut prompt = Vec::with_capacity(chain.len() + 2);
        prompt.push(ApiMessage {
            role: Side::System.as_str(),
            content: SYSTEM_PROMPT.to_string(),
        });
        prompt.extend(chain);
        prompt.push(ApiMessage {
            role: Side::User.as_str(),
            content: text.to_string(),
        });
        prompt
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Turn, RequestError> {
        let prompt = {
            let store = self.messages.lock().await;
            Self::build_prompt(&store, request.parent_message_id(), request.text())
        };
        let model = request
            .model()
            .map(|m| m.as_str())
            .unwrap_or(self.model.as_str());

        debug!(
            "POST {} (model={}, {} messages)",
            self.url,
            model,
            prompt.len()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(credential.expose())
            .json(&ApiRequest {
                model,
                messages: &prompt,
            })
            .send()
            .await
            .map_err(|e| RequestError::network(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Completion API returned {status}: {body}");
            return Err(RequestError::status(status.as_u16(), body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| RequestError::malformed(format!("failed to parse response: {e}")))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RequestError::malformed("response contained no choices"))?;
        let reply_id = api_response
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let user_id = Uuid::new_v4().to_string();

        let mut store = self.messages.lock().await;
        store.insert(
            user_id.clone(),
            StoredMessage {
                side: Side::User,
                text: request.text().to_string(),
                parent: request.parent_message_id().map(str::to_string),
            },
        );
        store.insert(
            reply_id.clone(),
            StoredMessage {
                side: Side::Assistant,
                text: text.clone(),
                parent: Some(user_id),
            },
        );

        Ok(Turn::assistant(text, Some(reply_id)))
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

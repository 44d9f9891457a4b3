use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Model variants the completion provider accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CompletionModel {
    #[serde(rename = "gpt-3.5-turbo-0301")]
    Gpt35Turbo0301,
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-0314")]
    Gpt4_0314,
    #[serde(rename = "gpt-4-32k")]
    Gpt4_32k,
    #[serde(rename = "gpt-4-32k-0314")]
    Gpt4_32k0314,
}

impl CompletionModel {
    pub const ALL: [CompletionModel; 6] = [
        CompletionModel::Gpt35Turbo0301,
        CompletionModel::Gpt35Turbo,
        CompletionModel::Gpt4,
        CompletionModel::Gpt4_0314,
        CompletionModel::Gpt4_32k,
        CompletionModel::Gpt4_32k0314,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionModel::Gpt35Turbo0301 => "gpt-3.5-turbo-0301",
            CompletionModel::Gpt35Turbo => "gpt-3.5-turbo",
            CompletionModel::Gpt4 => "gpt-4",
            CompletionModel::Gpt4_0314 => "gpt-4-0314",
            CompletionModel::Gpt4_32k => "gpt-4-32k",
            CompletionModel::Gpt4_32k0314 => "gpt-4-32k-0314",
        }
    }
}

impl std::str::FromStr for CompletionModel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| DomainError::invalid_input(format!("Unknown model: {}", s.trim())))
    }
}

impl std::fmt::Display for CompletionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session-level knobs sent along with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<CompletionModel>,
}

impl CompletionParams {
    pub fn with_model(model: CompletionModel) -> Self {
        Self { model: Some(model) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completion_params: Option<CompletionParams>,
}

impl CompletionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parent_message_id: None,
            completion_params: None,
        }
    }

    pub fn with_parent_message_id(mut self, id: impl Into<String>) -> Self {
        self.parent_message_id = Some(id.into());
        self
    }

    pub fn with_completion_params(mut self, params: CompletionParams) -> Self {
        self.completion_params = Some(params);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent_message_id(&self) -> Option<&str> {
        self.parent_message_id.as_deref()
    }

    pub fn completion_params(&self) -> Option<&CompletionParams> {
        self.completion_params.as_ref()
    }

    /// Model override carried by this request, if any.
    pub fn model(&self) -> Option<CompletionModel> {
        self.completion_params.as_ref().and_then(|p| p.model)
    }
}

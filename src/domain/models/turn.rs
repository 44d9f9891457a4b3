use serde::{Deserialize, Serialize};

use crate::domain::RequestError;

/// Who a turn is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    User,
    Assistant,
    System,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::User => "user",
            Side::Assistant => "assistant",
            Side::System => "system",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renderable snapshot of a failed completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl From<&RequestError> for ErrorInfo {
    fn from(err: &RequestError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status_code(),
            payload: err.payload(),
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    side: Side,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            side: Side::User,
            text: text.into(),
            id: None,
            error: None,
        }
    }

    pub fn assistant(text: impl Into<String>, id: Option<String>) -> Self {
        Self {
            side: Side::Assistant,
            text: text.into(),
            id,
            error: None,
        }
    }

    /// Assistant-slot turn standing in for a reply that never arrived.
    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            side: Side::Assistant,
            text: String::new(),
            id: None,
            error: Some(error),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_turn_occupies_assistant_slot() {
        let err = RequestError::status(429, "slow down");
        let turn = Turn::failed(ErrorInfo::from(&err));

        assert_eq!(turn.side(), Side::Assistant);
        assert!(turn.is_error());
        assert!(turn.id().is_none());
        assert_eq!(turn.error().unwrap().status, Some(429));
    }

    #[test]
    fn test_turn_serialization_omits_empty_fields() {
        let json = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(json, serde_json::json!({"side": "user", "text": "hello"}));

        let json = serde_json::to_value(Turn::assistant("hi", Some("abc".into()))).unwrap();
        assert_eq!(json["id"], "abc");
        assert_eq!(json["side"], "assistant");
    }
}

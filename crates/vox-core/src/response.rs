//! Invocation response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the platform should continue the conversation after speaking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    /// Speak and end the turn.
    #[default]
    Tell,
    /// Speak and wait for an answer matched against the skill's intents.
    Ask,
    /// Speak and wait for a free-text answer.
    AskFreetext,
}

/// The envelope returned to the voice platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl Response {
    pub fn new(text: impl Into<String>, kind: ResponseType) -> Self {
        Self {
            text: text.into(),
            kind,
            session: None,
            result: None,
        }
    }

    pub fn tell(text: impl Into<String>) -> Self {
        Self::new(text, ResponseType::Tell)
    }

    pub fn ask(text: impl Into<String>) -> Self {
        Self::new(text, ResponseType::Ask)
    }

    pub fn ask_freetext(text: impl Into<String>) -> Self {
        Self::new(text, ResponseType::AskFreetext)
    }

    /// Attaches session attributes to be stored for the next turn.
    pub fn with_session(mut self, attributes: HashMap<String, String>) -> Self {
        self.session = Some(attributes);
        self
    }

    /// Attaches a machine-readable result for client devices.
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Self::tell(text)
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Self::tell(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_becomes_tell() {
        let response = Response::from("Hello");
        assert_eq!(response.kind, ResponseType::Tell);
        assert_eq!(response.text, "Hello");
    }

    #[test]
    fn test_serialize() {
        let response = Response::ask("Which city?");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"text": "Which city?", "type": "ASK"})
        );

        let response = Response::ask_freetext("Say anything").with_result(json!({"ok": true}));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"text": "Say anything", "type": "ASK_FREETEXT", "result": {"ok": true}})
        );
    }
}

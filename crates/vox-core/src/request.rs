//! Invocation request types.
//!
//! An [`InvokeRequest`] is what the voice platform sends for every user turn:
//! the intent the NLU matched, the slots it filled, and the conversation's
//! session store. The JSON layout is camelCase.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::AttributeV2;

/// A single skill invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    pub context: Arc<Context>,
    #[serde(default)]
    pub session: Arc<Session>,
    #[serde(default = "default_spi_version")]
    pub spi_version: String,
}

fn default_spi_version() -> String {
    "1.0".to_string()
}

impl InvokeRequest {
    pub fn new(context: Context, session: Session) -> Self {
        Self {
            context: Arc::new(context),
            session: Arc::new(session),
            spi_version: default_spi_version(),
        }
    }

    /// Shortcut for a request carrying only an intent name.
    pub fn for_intent(intent: impl Into<String>) -> Self {
        Self::new(Context::new(intent), Session::default())
    }

    pub fn intent(&self) -> &str {
        &self.context.intent
    }
}

// ============================================================================
// Context
// ============================================================================

/// Invocation metadata: intent name, locale, tokens and the filled slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Context {
    pub intent: String,
    pub locale: Option<String>,
    pub skill_id: Option<String>,
    pub tokens: HashMap<String, String>,
    pub configuration: HashMap<String, Vec<String>>,
    /// Plain slots: each name maps to one or more candidate values.
    pub attributes: HashMap<String, Vec<String>>,
    /// Typed slots, as attribute mappings.
    pub attributes_v2: HashMap<String, Vec<AttributeV2<Value>>>,
    pub client_attributes: Value,
}

impl Context {
    pub fn new(intent: impl Into<String>) -> Self {
        Self {
            intent: intent.into(),
            ..Self::default()
        }
    }

    /// Adds a plain slot with its candidate values.
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a typed slot.
    pub fn with_attribute_v2<I>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = AttributeV2<Value>>,
    {
        self.attributes_v2
            .insert(name.into(), values.into_iter().collect());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(Vec::as_slice)
    }

    pub fn attribute_v2(&self, name: &str) -> Option<&[AttributeV2<Value>]> {
        self.attributes_v2.get(name).map(Vec::as_slice)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Conversation state carried between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub id: String,
    pub new: bool,
    pub attributes: HashMap<String, String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            new: true,
            attributes: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }
}

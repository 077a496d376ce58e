//! Conversation message types.
//!
//! A `Message` is one rendered turn. Agent turns may carry quick options and
//! at most one structured payload.

use super::payload::Payload;
use crate::intent::Intent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a message inside the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for messages not yet assigned an id by the store.
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

/// What tapping a quick option does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MenuAction {
    /// Ask a clarifying question for the intent, no generation call.
    SelectIntent(Intent),
    /// Send the given text as if typed by the user.
    Ask(String),
    /// Go back to the top-level menu.
    ShowMenu,
}

/// A tappable option attached to an agent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickOption {
    pub id: String,
    pub label: String,
    pub action: MenuAction,
}

impl QuickOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>, action: MenuAction) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
        }
    }
}

/// A single rendered conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub quick_options: Vec<QuickOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    /// A user turn. The id is assigned when the message is appended.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::default(),
            sender: Sender::User,
            text: Some(text.into()),
            timestamp: Utc::now(),
            quick_options: Vec::new(),
            payload: None,
            is_loading: false,
            is_error: false,
        }
    }

    /// An agent turn with options.
    pub fn agent(text: impl Into<String>, quick_options: Vec<QuickOption>) -> Self {
        Self {
            id: MessageId::default(),
            sender: Sender::Agent,
            text: Some(text.into()),
            timestamp: Utc::now(),
            quick_options,
            payload: None,
            is_loading: false,
            is_error: false,
        }
    }

    /// The loading placeholder shown while a request is in flight.
    pub fn placeholder() -> Self {
        Self {
            id: MessageId::default(),
            sender: Sender::Agent,
            text: None,
            timestamp: Utc::now(),
            quick_options: Vec::new(),
            payload: None,
            is_loading: true,
            is_error: false,
        }
    }

    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_payload(mut self, payload: Option<Payload>) -> Self {
        self.payload = payload;
        self
    }

    /// Applies a partial update in place. Id, sender, and timestamp never change.
    pub fn apply(&mut self, patch: MessagePatch) {
        if let Some(text) = patch.text {
            self.text = Some(text);
        }
        if let Some(options) = patch.quick_options {
            self.quick_options = options;
        }
        if let Some(payload) = patch.payload {
            self.payload = payload;
        }
        if let Some(is_loading) = patch.is_loading {
            self.is_loading = is_loading;
        }
        if let Some(is_error) = patch.is_error {
            self.is_error = is_error;
        }
    }
}

/// Partial update for `MessageStore::update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub quick_options: Option<Vec<QuickOption>>,
    /// `Some(None)` clears the payload.
    pub payload: Option<Option<Payload>>,
    pub is_loading: Option<bool>,
    pub is_error: Option<bool>,
}

/// The normalized outcome of a request, ready to replace a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageUpdate {
    pub text: String,
    pub quick_options: Vec<QuickOption>,
    pub payload: Option<Payload>,
    pub is_error: bool,
}

impl MessageUpdate {
    /// A user-visible, continuable error.
    pub fn error(text: impl Into<String>, quick_options: Vec<QuickOption>) -> Self {
        Self {
            text: text.into(),
            quick_options,
            payload: None,
            is_error: true,
        }
    }
}

impl From<MessageUpdate> for MessagePatch {
    fn from(update: MessageUpdate) -> Self {
        Self {
            text: Some(update.text),
            quick_options: Some(update.quick_options),
            payload: Some(update.payload),
            is_loading: Some(false),
            is_error: Some(update.is_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update_resolves_placeholder() {
        let mut message = Message::placeholder().with_id(MessageId::new("m-1"));
        let update = MessageUpdate {
            text: "Listo".to_string(),
            quick_options: vec![QuickOption::new("menu", "Menú", MenuAction::ShowMenu)],
            payload: None,
            is_error: false,
        };

        message.apply(update.into());

        assert_eq!(message.id.as_str(), "m-1");
        assert_eq!(message.text.as_deref(), Some("Listo"));
        assert!(!message.is_loading);
        assert_eq!(message.quick_options.len(), 1);
    }

    #[test]
    fn test_menu_action_serialization() {
        let json = serde_json::to_string(&MenuAction::SelectIntent(Intent::MealPlan)).unwrap();
        assert_eq!(json, r#"{"type":"select_intent","value":"meal_plan"}"#);
        let back: MenuAction = serde_json::from_str(r#"{"type":"show_menu"}"#).unwrap();
        assert_eq!(back, MenuAction::ShowMenu);
    }
}

//! Conversation message types.
//!
//! This module contains types for representing messages in the chat
//! transcript, including roles and speaker labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::PersonaMode;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the model.
    Model,
}

/// A single message in the chat transcript.
///
/// Messages are immutable once created; the transcript only ever appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The text of the message.
    pub text: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a user message stamped with the current time.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    /// Creates a model message stamped with the current time.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Model, text)
    }

    fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Label shown next to the message, which for the model depends on the active mode.
    pub fn speaker_label(&self, mode: PersonaMode) -> &'static str {
        match (self.role, mode) {
            (MessageRole::User, _) => "Resetowicz",
            (MessageRole::Model, PersonaMode::Storytelling) => "Gawędziarz Wojtek",
            (MessageRole::Model, PersonaMode::Demotivation) => "Wojciech Borkowy",
        }
    }

    /// Hour and minute of the timestamp, as shown in the transcript.
    pub fn short_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_labels_follow_mode() {
        let user = ChatMessage::user("Jak odmienić der, die, das?");
        let model = ChatMessage::model("Wahnsinn. Idź na szaszłyka.");

        assert_eq!(user.speaker_label(PersonaMode::Storytelling), "Resetowicz");
        assert_eq!(model.speaker_label(PersonaMode::Demotivation), "Wojciech Borkowy");
        assert_eq!(model.speaker_label(PersonaMode::Storytelling), "Gawędziarz Wojtek");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Model).unwrap();
        assert_eq!(json, "\"model\"");
    }
}

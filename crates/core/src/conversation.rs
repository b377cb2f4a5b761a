//! Chat transcript types
//!
//! Raw material for knowledge-base construction: individual chat messages
//! as exported from the contact platform, and conversations grouped from
//! them per contact id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Customer,
    Agent,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::Customer => "customer",
            SpeakerRole::Agent => "agent",
        }
    }
}

impl std::fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single message from a chat export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Contact id the message belongs to
    pub contact_id: String,
    /// Message text
    pub text: String,
    /// Sender side
    pub role: SpeakerRole,
    /// When the message was sent
    pub timestamp: DateTime<Utc>,
    /// Position within the conversation
    #[serde(default)]
    pub message_number: u32,
}

impl ChatMessage {
    pub fn new(
        contact_id: impl Into<String>,
        role: SpeakerRole,
        text: impl Into<String>,
    ) -> Self {
        Self {
            contact_id: contact_id.into(),
            text: text.into(),
            role,
            timestamp: Utc::now(),
            message_number: 0,
        }
    }

    /// Create a customer message
    pub fn customer(contact_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(contact_id, SpeakerRole::Customer, text)
    }

    /// Create an agent message
    pub fn agent(contact_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(contact_id, SpeakerRole::Agent, text)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_message_number(mut self, message_number: u32) -> Self {
        self.message_number = message_number;
        self
    }
}

/// All messages for one contact id, in message order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Contact id shared by every message
    pub id: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Customer-side message texts, in order
    pub fn customer_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == SpeakerRole::Customer)
            .map(|m| m.text.as_str())
    }

    /// Agent-side message texts, in order
    pub fn agent_messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == SpeakerRole::Agent)
            .map(|m| m.text.as_str())
    }

    /// Timestamp of the earliest message
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).min()
    }

    /// Timestamp of the latest message
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.messages.iter().map(|m| m.timestamp).max()
    }

    /// Wall-clock span of the conversation in seconds
    pub fn duration_secs(&self) -> i64 {
        match (self.started_at(), self.ended_at()) {
            (Some(start), Some(end)) => (end - start).num_seconds(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::customer("contact-9", "my internet is slow")
            .with_message_number(1);
        assert_eq!(msg.role, SpeakerRole::Customer);
        assert_eq!(msg.message_number, 1);
    }

    #[test]
    fn test_conversation_sides_and_duration() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 9, 4, 30).unwrap();

        let mut conv = Conversation::new("contact-9");
        conv.push(ChatMessage::customer("contact-9", "my internet is slow").with_timestamp(start));
        conv.push(ChatMessage::agent("contact-9", "let me run a line test").with_timestamp(end));

        assert_eq!(conv.customer_messages().count(), 1);
        assert_eq!(conv.agent_messages().count(), 1);
        assert_eq!(conv.duration_secs(), 270);
    }

    #[test]
    fn test_empty_conversation_duration() {
        let conv = Conversation::new("contact-0");
        assert!(conv.is_empty());
        assert_eq!(conv.duration_secs(), 0);
        assert!(conv.started_at().is_none());
    }
}

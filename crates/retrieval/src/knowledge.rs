//! Knowledge-base construction
//!
//! Folds raw chat exports into conversations, labels each with an outcome
//! and a topic, and embeds one representative text per conversation into a
//! caller-owned case store. Stores are passed in explicitly; nothing here
//! keeps ambient state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use case_assist_config::constants::knowledge;
use case_assist_core::{
    CaseRecord, ChatMessage, Conversation, EmbeddingProvider, Error, Outcome, Result, SpeakerRole,
};

use crate::store::CaseStore;

/// Category -> keywords table for first-message topic classification
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "billing",
        &["bill", "charge", "payment", "cost", "price", "fee", "refund"],
    ),
    (
        "technical",
        &["not working", "broken", "issue", "problem", "error", "bug"],
    ),
    (
        "account",
        &["account", "login", "password", "access", "profile"],
    ),
    (
        "service",
        &["cancel", "upgrade", "downgrade", "change", "plan"],
    ),
    (
        "roaming",
        &["roaming", "overseas", "international", "abroad"],
    ),
    ("data", &["data", "internet", "wifi", "connection", "slow"]),
];

/// Fallback topic when no category keyword matches
pub const TOPIC_OTHER: &str = "other";

const RESOLUTION_INDICATORS: &[&str] = &[
    "resolved", "fixed", "sorted", "done", "complete", "thank you", "thanks", "perfect", "great",
    "excellent",
];

const ESCALATION_INDICATORS: &[&str] = &[
    "escalate",
    "escalated",
    "supervisor",
    "manager",
    "complaint",
    "ombudsman",
];

/// Group a flat message log into conversations keyed by contact id.
///
/// First-appearance order of contact ids is preserved; messages within a
/// conversation sort by message number.
pub fn group_messages(messages: Vec<ChatMessage>) -> Vec<Conversation> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: HashMap<String, Vec<ChatMessage>> = HashMap::new();

    for message in messages {
        if !grouped.contains_key(&message.contact_id) {
            order.push(message.contact_id.clone());
        }
        grouped
            .entry(message.contact_id.clone())
            .or_default()
            .push(message);
    }

    order
        .into_iter()
        .map(|id| {
            let mut msgs = grouped.remove(&id).unwrap_or_default();
            msgs.sort_by_key(|m| m.message_number);
            Conversation { id, messages: msgs }
        })
        .collect()
}

/// Label a conversation from its closing messages.
///
/// Escalation indicators win over resolution indicators: a chat that ends
/// with "thanks, please escalate to a supervisor" is escalated.
pub fn detect_outcome(conversation: &Conversation) -> Outcome {
    let closing = conversation
        .messages
        .iter()
        .rev()
        .take(knowledge::OUTCOME_WINDOW)
        .map(|m| m.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    if ESCALATION_INDICATORS.iter().any(|kw| closing.contains(kw)) {
        return Outcome::Escalated;
    }
    if RESOLUTION_INDICATORS.iter().any(|kw| closing.contains(kw)) {
        return Outcome::Resolved;
    }
    Outcome::Unresolved
}

/// Categorize a conversation by its first customer message, which usually
/// states the issue
pub fn classify_topic(conversation: &Conversation) -> String {
    let first = conversation
        .messages
        .iter()
        .find(|m| m.role == SpeakerRole::Customer);

    let Some(message) = first else {
        return TOPIC_OTHER.to_string();
    };

    let text = message.text.to_lowercase();
    for (topic, keywords) in TOPIC_KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return (*topic).to_string();
        }
    }
    TOPIC_OTHER.to_string()
}

/// Representative text embedded for a conversation: the leading customer
/// and agent messages, prefixed by side
pub fn representative_text(conversation: &Conversation) -> String {
    let take = knowledge::REPRESENTATIVE_MESSAGES;
    let customer: Vec<&str> = conversation.customer_messages().take(take).collect();
    let agent: Vec<&str> = conversation.agent_messages().take(take).collect();

    format!("Customer: {} Agent: {}", customer.join(" "), agent.join(" "))
}

/// Builds a case store from conversations using an embedding provider
pub struct KnowledgeBuilder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl KnowledgeBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed and upsert every conversation into `store`.
    ///
    /// Conversations with no messages are skipped with a warning. Returns
    /// the number of cases ingested.
    pub async fn ingest(
        &self,
        conversations: &[Conversation],
        store: &mut CaseStore,
    ) -> Result<usize> {
        let mut count = 0;

        for conversation in conversations {
            if conversation.is_empty() {
                tracing::warn!(id = %conversation.id, "Skipping conversation with no messages");
                continue;
            }

            let text = representative_text(conversation);
            let embedding = self.provider.embed(&text).await?;

            let record = CaseRecord::new(
                conversation.id.clone(),
                text,
                embedding,
                detect_outcome(conversation),
                classify_topic(conversation),
                conversation.started_at().unwrap_or_else(Utc::now),
            );

            store.upsert(record)?;
            count += 1;
        }

        tracing::info!(
            conversations = count,
            cases = store.len(),
            "Knowledge base ingestion complete"
        );
        Ok(count)
    }

    /// Build a fresh store sized to the provider dimension
    pub async fn build_store(&self, conversations: &[Conversation]) -> Result<CaseStore> {
        let mut store = CaseStore::new(self.provider.dim());
        self.ingest(conversations, &mut store).await?;
        Ok(store)
    }
}

/// On-disk chat export: a list of messages
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatLogFile {
    /// Version for format compatibility
    #[serde(default)]
    pub version: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Read one chat export (JSON or YAML by extension)
pub fn load_chat_log(path: &Path) -> Result<Vec<ChatMessage>> {
    let content = std::fs::read_to_string(path)?;

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let log: ChatLogFile = match extension {
        "json" => serde_json::from_str(&content).map_err(|e| {
            Error::InvalidArgument(format!("JSON parse error in {}: {}", path.display(), e))
        })?,
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| {
            Error::InvalidArgument(format!("YAML parse error in {}: {}", path.display(), e))
        })?,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "Unsupported chat log type: {}",
                extension
            )))
        }
    };

    Ok(log.messages)
}

/// Scan a directory of chat exports.
///
/// Unreadable files are logged and skipped so one bad export does not sink
/// the whole load. A missing directory yields an empty log with a warning.
pub fn load_chat_dir(dir: &Path) -> Result<Vec<ChatMessage>> {
    if !dir.exists() {
        tracing::warn!(path = %dir.display(), "Chat log directory does not exist");
        return Ok(Vec::new());
    }

    let mut all = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(extension, "json" | "yaml" | "yml") {
            continue;
        }

        match load_chat_log(&path) {
            Ok(mut messages) => {
                tracing::info!(
                    file = %path.display(),
                    messages = messages.len(),
                    "Loaded chat log"
                );
                all.append(&mut messages);
            }
            Err(e) => {
                tracing::error!(
                    file = %path.display(),
                    error = %e,
                    "Failed to load chat log"
                );
            }
        }
    }

    Ok(all)
}

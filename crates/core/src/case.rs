//! Case records and retrieval result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a historical conversation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The customer's issue was resolved during the conversation
    Resolved,
    /// The conversation ended without a resolution
    Unresolved,
    /// The conversation was handed to a supervisor or second-line team
    Escalated,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Resolved => "resolved",
            Outcome::Unresolved => "unresolved",
            Outcome::Escalated => "escalated",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A historical conversation with its embedding and outcome metadata
///
/// Records are created once during knowledge-base construction and never
/// mutated afterwards; outcome corrections go through a store upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique case identifier (typically the contact id)
    pub id: String,
    /// Representative text of the conversation, embedded at ingestion
    pub text: String,
    /// Embedding of `text`; length is fixed per store
    pub embedding: Vec<f32>,
    /// Final outcome of the conversation
    pub outcome: Outcome,
    /// Issue category label
    pub topic: String,
    /// When the conversation occurred, used for recency tie-breaking
    pub timestamp: DateTime<Utc>,
}

impl CaseRecord {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        outcome: Outcome,
        topic: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
            outcome,
            topic: topic.into(),
            timestamp,
        }
    }
}

/// An (id, score) pair returned by the similarity index
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCase {
    /// Case identifier
    pub id: String,
    /// Cosine similarity to the query, in [-1, 1]
    pub score: f32,
}

/// Caller-facing projection of a retrieved case
#[derive(Debug, Clone, Serialize)]
pub struct CaseSummary {
    /// Case identifier
    pub id: String,
    /// Issue category label
    pub topic: String,
    /// Final outcome of the conversation
    pub outcome: Outcome,
    /// Cosine similarity to the query
    pub similarity: f32,
    /// Short excerpt of the case text
    pub excerpt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&Outcome::Escalated).unwrap(),
            "\"escalated\""
        );
        let parsed: Outcome = serde_json::from_str("\"resolved\"").unwrap();
        assert_eq!(parsed, Outcome::Resolved);
    }

    #[test]
    fn test_record_round_trip() {
        let record = CaseRecord::new(
            "contact-001",
            "Customer: my bill is wrong Agent: let me check that",
            vec![0.1, 0.2, 0.3],
            Outcome::Resolved,
            "billing",
            Utc::now(),
        );

        let json = serde_json::to_string(&record).unwrap();
        let parsed: CaseRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, "contact-001");
        assert_eq!(parsed.embedding.len(), 3);
        assert_eq!(parsed.outcome, Outcome::Resolved);
    }
}

//! Issue insights
//!
//! Per-topic aggregates over the case store: volumes, resolution rates,
//! and the most common terms appearing in case texts.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use case_assist_core::Outcome;

use crate::store::CaseStore;

/// Number of common terms reported per topic
const COMMON_TERMS_TOP_K: usize = 10;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid word pattern"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "i", "you", "we", "they",
        "it", "this", "that", "what", "which", "who", "whom", "whose", "to", "for", "in", "on",
        "at", "by", "with", "from", "and", "or", "but", "if", "then", "else", "have", "has",
        "had", "will", "would", "can", "could", "your", "my", "me", "please",
        // Every representative text carries the side prefixes
        "customer", "agent",
    ]
    .into_iter()
    .collect()
});

/// Aggregated view of one topic
#[derive(Debug, Clone, Serialize)]
pub struct TopicInsight {
    pub topic: String,
    pub total_cases: usize,
    pub resolved_cases: usize,
    pub escalated_cases: usize,
    /// resolved / total, in [0, 1]
    pub resolution_rate: f64,
    /// Most frequent terms across the topic's case texts
    pub common_terms: Vec<String>,
}

/// Insights for every topic present in the store, highest volume first
/// (ties by topic name for determinism)
pub fn topic_insights(store: &CaseStore) -> Vec<TopicInsight> {
    let mut by_topic: HashMap<&str, Vec<&case_assist_core::CaseRecord>> = HashMap::new();
    for record in store.all() {
        by_topic.entry(record.topic.as_str()).or_default().push(record);
    }

    let mut insights: Vec<TopicInsight> = by_topic
        .into_iter()
        .map(|(topic, records)| build_insight(topic, &records))
        .collect();

    insights.sort_by(|a, b| {
        b.total_cases
            .cmp(&a.total_cases)
            .then_with(|| a.topic.cmp(&b.topic))
    });
    insights
}

/// Insight for a single topic; `None` when the store has no such cases
pub fn insight_for_topic(store: &CaseStore, topic: &str) -> Option<TopicInsight> {
    let records: Vec<&case_assist_core::CaseRecord> = store
        .all()
        .iter()
        .filter(|r| r.topic == topic)
        .collect();

    if records.is_empty() {
        return None;
    }
    Some(build_insight(topic, &records))
}

fn build_insight(topic: &str, records: &[&case_assist_core::CaseRecord]) -> TopicInsight {
    let total_cases = records.len();
    let resolved_cases = records
        .iter()
        .filter(|r| r.outcome == Outcome::Resolved)
        .count();
    let escalated_cases = records
        .iter()
        .filter(|r| r.outcome == Outcome::Escalated)
        .count();

    let resolution_rate = if total_cases > 0 {
        resolved_cases as f64 / total_cases as f64
    } else {
        0.0
    };

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();

    TopicInsight {
        topic: topic.to_string(),
        total_cases,
        resolved_cases,
        escalated_cases,
        resolution_rate,
        common_terms: common_terms(&texts, COMMON_TERMS_TOP_K),
    }
}

/// Most frequent words across `texts`, short words and stopwords excluded.
/// Frequency descending, ties by term ascending for determinism.
fn common_terms(texts: &[&str], top_k: usize) -> Vec<String> {
    let mut frequency: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let lowered = text.to_lowercase();
        for word in WORD.find_iter(&lowered) {
            let word = word.as_str();
            if word.len() > 3 && !STOPWORDS.contains(word) {
                *frequency.entry(word.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut terms: Vec<(String, usize)> = frequency.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.into_iter().take(top_k).map(|(term, _)| term).collect()
}

//! Agent assist
//!
//! Retrieval-backed help for live conversations: similar historical cases,
//! precedents that actually got resolved, and a confidence score for how
//! well the history covers the current issue. Response generation stays
//! with the surrounding application.

use serde::Serialize;

use case_assist_core::{CaseIndex, CaseSummary, Outcome, Result};

use crate::engine::{RetrievalEngine, SearchOptions};

/// Bonus applied to resolved cases when scoring confidence
const RESOLVED_BONUS: f32 = 0.2;

/// A resolved precedent for the current issue
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSuggestion {
    pub case_id: String,
    pub topic: String,
    pub similarity: f32,
    pub excerpt: String,
}

impl From<CaseSummary> for ResolutionSuggestion {
    fn from(summary: CaseSummary) -> Self {
        Self {
            case_id: summary.id,
            topic: summary.topic,
            similarity: summary.similarity,
            excerpt: summary.excerpt,
        }
    }
}

/// Combined assist output for one customer message
#[derive(Debug, Clone, Serialize)]
pub struct AssistReport {
    /// Similar cases regardless of outcome
    pub similar_cases: Vec<CaseSummary>,
    /// Similar cases that ended resolved
    pub suggestions: Vec<ResolutionSuggestion>,
    /// How well the history covers the issue, in [0, 1.2]
    pub confidence: f32,
}

/// Similar resolved cases for the given issue text
pub async fn suggest_resolutions<I: CaseIndex>(
    engine: &RetrievalEngine<I>,
    issue_text: &str,
    options: &SearchOptions,
) -> Result<Vec<ResolutionSuggestion>> {
    let opts = options.clone().with_outcome(Outcome::Resolved);
    let cases = engine.find_similar(issue_text, &opts).await?;

    Ok(cases.into_iter().map(ResolutionSuggestion::from).collect())
}

/// Confidence in the retrieved precedents.
///
/// Similarity-weighted mean of (similarity + resolved bonus); zero when
/// nothing was retrieved. High-similarity resolved precedents push the
/// score up, weak matches drag it down.
pub fn confidence_score(cases: &[CaseSummary]) -> f32 {
    let mut total = 0.0f32;
    let mut weights = 0.0f32;

    for case in cases {
        let bonus = if case.outcome == Outcome::Resolved {
            RESOLVED_BONUS
        } else {
            0.0
        };

        total += (case.similarity + bonus) * case.similarity;
        weights += case.similarity;
    }

    if weights > 0.0 {
        total / weights
    } else {
        0.0
    }
}

/// Assemble the full assist view for one customer message.
///
/// Two retrievals, mirroring how agents consume the output: the similar
/// cases panel is outcome-agnostic, while suggestions only come from
/// resolved precedents (which the outcome filter can surface even when
/// unresolved cases rank higher).
pub async fn assist<I: CaseIndex>(
    engine: &RetrievalEngine<I>,
    customer_message: &str,
    options: &SearchOptions,
) -> Result<AssistReport> {
    let similar_cases = engine.find_similar(customer_message, options).await?;
    let suggestions = suggest_resolutions(engine, customer_message, options).await?;
    let confidence = confidence_score(&similar_cases);

    tracing::debug!(
        similar = similar_cases.len(),
        suggestions = suggestions.len(),
        confidence,
        "Assist report assembled"
    );

    Ok(AssistReport {
        similar_cases,
        suggestions,
        confidence,
    })
}

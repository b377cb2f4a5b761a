//! Centralized constants for case retrieval
//!
//! Single source of truth for default values used across the workspace.
//! Settings defaults and engine defaults both read from here.

/// Retrieval engine defaults
pub mod retrieval {
    /// Default number of cases returned by a similarity query
    pub const DEFAULT_TOP_K: usize = 5;

    /// Similarity floor below which a case is considered unrelated.
    /// Empirically chosen; kept configurable rather than derived.
    pub const SIMILARITY_THRESHOLD: f32 = 0.7;

    /// Candidate over-fetch multiplier applied before post-filtering,
    /// so the outcome filter does not starve the result set
    pub const OVER_FETCH_FACTOR: usize = 3;

    /// Budget for the embedding-provider call, covering the single retry
    pub const PROVIDER_TIMEOUT_MS: u64 = 5_000;

    /// Backoff before the single embedding retry
    pub const RETRY_BACKOFF_MS: u64 = 250;

    /// Maximum excerpt length in a case summary, in grapheme clusters
    pub const EXCERPT_MAX_GRAPHEMES: usize = 160;
}

/// Knowledge-base construction defaults
pub mod knowledge {
    /// Leading messages from each side used as representative text
    pub const REPRESENTATIVE_MESSAGES: usize = 3;

    /// Closing messages scanned for outcome indicators
    pub const OUTCOME_WINDOW: usize = 3;

    /// Default snapshot location for the persisted case store
    pub const DEFAULT_STORE_PATH: &str = "data/case_store.json";

    /// Default directory scanned for chat exports
    pub const DEFAULT_CHAT_LOG_DIR: &str = "data/chat_logs";
}

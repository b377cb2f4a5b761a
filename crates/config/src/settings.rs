//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{knowledge, retrieval};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Retrieval engine configuration
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Knowledge-base construction configuration
    #[serde(default)]
    pub knowledge: KnowledgeSettings,
}

/// Retrieval engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Default number of results per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a case to surface
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Candidate multiplier applied before outcome filtering
    #[serde(default = "default_over_fetch_factor")]
    pub over_fetch_factor: usize,

    /// Embedding call budget in milliseconds, covering the single retry
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Retry the embedding call once on transient failure
    #[serde(default = "default_true")]
    pub retry_enabled: bool,

    /// Backoff before the retry, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Excerpt length in case summaries, in grapheme clusters
    #[serde(default = "default_excerpt_max_graphemes")]
    pub excerpt_max_graphemes: usize,
}

/// Knowledge-base settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    /// Where the case-store snapshot is persisted
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Directory scanned for chat exports
    #[serde(default = "default_chat_log_dir")]
    pub chat_log_dir: String,
}

fn default_top_k() -> usize {
    retrieval::DEFAULT_TOP_K
}

fn default_similarity_threshold() -> f32 {
    retrieval::SIMILARITY_THRESHOLD
}

fn default_over_fetch_factor() -> usize {
    retrieval::OVER_FETCH_FACTOR
}

fn default_provider_timeout_ms() -> u64 {
    retrieval::PROVIDER_TIMEOUT_MS
}

fn default_retry_backoff_ms() -> u64 {
    retrieval::RETRY_BACKOFF_MS
}

fn default_excerpt_max_graphemes() -> usize {
    retrieval::EXCERPT_MAX_GRAPHEMES
}

fn default_store_path() -> String {
    knowledge::DEFAULT_STORE_PATH.to_string()
}

fn default_chat_log_dir() -> String {
    knowledge::DEFAULT_CHAT_LOG_DIR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            over_fetch_factor: default_over_fetch_factor(),
            provider_timeout_ms: default_provider_timeout_ms(),
            retry_enabled: true,
            retry_backoff_ms: default_retry_backoff_ms(),
            excerpt_max_graphemes: default_excerpt_max_graphemes(),
        }
    }
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            chat_log_dir: default_chat_log_dir(),
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.retrieval;

        if r.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if r.over_fetch_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.over_fetch_factor".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if r.provider_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.provider_timeout_ms".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !r.similarity_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.similarity_threshold".to_string(),
                message: format!("Must be finite, got {}", r.similarity_threshold),
            });
        }

        // Cosine similarity lives in [-1, 1]; values outside never match
        // or always match, which is legal but usually a mistake.
        if !(-1.0..=1.0).contains(&r.similarity_threshold) {
            tracing::warn!(
                threshold = r.similarity_threshold,
                "retrieval.similarity_threshold is outside [-1, 1]"
            );
        }

        if r.retry_enabled && r.retry_backoff_ms >= r.provider_timeout_ms {
            tracing::warn!(
                backoff_ms = r.retry_backoff_ms,
                timeout_ms = r.provider_timeout_ms,
                "Retry backoff leaves no budget for a second embedding attempt"
            );
        }

        if r.excerpt_max_graphemes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.excerpt_max_graphemes".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.knowledge.store_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "knowledge.store_path".to_string(),
                message: "Must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment variables
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("CASE_ASSIST")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.retrieval.over_fetch_factor, 3);
        assert!(settings.retrieval.retry_enabled);
        assert!((settings.retrieval.similarity_threshold - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validation_rejects_zero_top_k() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 0;
        assert!(settings.validate().is_err());

        settings.retrieval.top_k = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_over_fetch() {
        let mut settings = Settings::default();
        settings.retrieval.over_fetch_factor = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_threshold() {
        let mut settings = Settings::default();
        settings.retrieval.similarity_threshold = f32::NAN;
        assert!(settings.validate().is_err());

        // Out-of-range but finite thresholds only warn; a query-time
        // threshold above 1.0 is a legal way to force empty results.
        settings.retrieval.similarity_threshold = 1.1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_store_path() {
        let mut settings = Settings::default();
        settings.knowledge.store_path = String::new();
        assert!(settings.validate().is_err());
    }
}

//! Configuration types for the query translator.

use std::time::Duration;

use fedquery_criteria::DEFAULT_MAX_IN;

/// Default root entity of translated queries.
pub const DEFAULT_ROOT_OBJECT_NAME: &str = "Person";

/// Default root identifier used to correlate sub-queries.
pub const DEFAULT_CORRELATION_PROPERTY: &str = "id";

/// Configuration for the query translator.
///
/// # Example
///
/// ```rust
/// use fedquery_translator::{CacheConfig, TranslatorConfig};
///
/// let config = TranslatorConfig::builder()
///     .with_root_object_name("Patient")
///     .with_max_in(500)
///     .with_cache(CacheConfig::default())
///     .build();
///
/// assert_eq!(config.root_object_name, "Patient");
/// assert_eq!(config.correlation_property, "id");
/// ```
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Root entity of the query and of every correlated sub-query.
    pub root_object_name: String,
    /// Root identifier that sub-queries are matched on.
    pub correlation_property: String,
    /// Largest value list a single `IN` may carry.
    pub max_in: usize,
    /// Cache configuration (None = caching disabled).
    pub cache: Option<CacheConfig>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            root_object_name: DEFAULT_ROOT_OBJECT_NAME.to_string(),
            correlation_property: DEFAULT_CORRELATION_PROPERTY.to_string(),
            max_in: DEFAULT_MAX_IN,
            cache: None,
        }
    }
}

impl TranslatorConfig {
    /// Creates a new builder for TranslatorConfig.
    pub fn builder() -> TranslatorConfigBuilder {
        TranslatorConfigBuilder::default()
    }
}

/// Builder for TranslatorConfig.
#[derive(Debug, Clone, Default)]
pub struct TranslatorConfigBuilder {
    config: TranslatorConfig,
}

impl TranslatorConfigBuilder {
    /// Sets the root entity name.
    pub fn with_root_object_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_object_name = name.into();
        self
    }

    /// Sets the correlation property used by sub-queries.
    pub fn with_correlation_property(mut self, property: impl Into<String>) -> Self {
        self.config.correlation_property = property.into();
        self
    }

    /// Sets the `IN` ceiling. Zero is rejected when a membership is built.
    pub fn with_max_in(mut self, max_in: usize) -> Self {
        self.config.max_in = max_in;
        self
    }

    /// Enables caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.config.cache = Some(cache);
        self
    }

    /// Builds the TranslatorConfig.
    pub fn build(self) -> TranslatorConfig {
        self.config
    }
}

/// Configuration for the translation cache.
///
/// # Example
///
/// ```rust
/// use fedquery_translator::CacheConfig;
/// use std::time::Duration;
///
/// let cache = CacheConfig {
///     max_entries: 1_000,
///     ttl: Duration::from_secs(60),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached translations.
    pub max_entries: usize,
    /// Time-to-live for cached entries.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_config_default() {
        let config = TranslatorConfig::default();
        assert_eq!(config.root_object_name, "Person");
        assert_eq!(config.correlation_property, "id");
        assert_eq!(config.max_in, 1000);
        assert!(config.cache.is_none());
    }

    #[test]
    fn test_translator_config_builder() {
        let config = TranslatorConfig::builder()
            .with_root_object_name("Patient")
            .with_correlation_property("patientId")
            .with_max_in(250)
            .with_cache(CacheConfig::default())
            .build();

        assert_eq!(config.root_object_name, "Patient");
        assert_eq!(config.correlation_property, "patientId");
        assert_eq!(config.max_in, 250);
        assert!(config.cache.is_some());
    }

    #[test]
    fn test_cache_config_default() {
        let cache = CacheConfig::default();
        assert_eq!(cache.max_entries, 10_000);
        assert_eq!(cache.ttl, Duration::from_secs(300));
    }
}

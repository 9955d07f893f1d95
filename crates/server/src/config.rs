//! Service configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! gives the stock behavior: five recommendations, no support threshold,
//! ten popular films.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum number of recommendations returned per user
    pub recommendation_limit: usize,

    /// Minimum co-rater support for a prediction to be recommended
    pub min_support: u32,

    /// Default size of the most-popular list when the caller gives none
    pub popular_count: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recommendation_limit: pipeline::DEFAULT_LIMIT,
            min_support: 1,
            popular_count: 10,
        }
    }
}

impl ServiceConfig {
    /// Configure the recommendation list size (default: 5)
    pub fn with_recommendation_limit(mut self, limit: usize) -> Self {
        self.recommendation_limit = limit;
        self
    }

    /// Configure the minimum co-rater support (default: 1)
    pub fn with_min_support(mut self, min_support: u32) -> Self {
        self.min_support = min_support;
        self
    }

    /// Configure the default most-popular count (default: 10)
    pub fn with_popular_count(mut self, count: usize) -> Self {
        self.popular_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.recommendation_limit, 5);
        assert_eq!(config.min_support, 1);
        assert_eq!(config.popular_count, 10);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{ "min_support": 3 }"#).unwrap();
        assert_eq!(config, ServiceConfig::default().with_min_support(3));

        let empty: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ServiceConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = ServiceConfig::default()
            .with_recommendation_limit(3)
            .with_popular_count(20);
        assert_eq!(config.recommendation_limit, 3);
        assert_eq!(config.popular_count, 20);
    }
}

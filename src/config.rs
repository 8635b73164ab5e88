//! Planner configuration.
//!
//! Every section deserializes with defaults for missing fields, so a partial
//! JSON or TOML document is enough. Reading the file is up to the caller.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::haversine::DEFAULT_WALKING_SPEED_KMH;

/// Environment variable holding the routing provider API key.
pub const API_KEY_ENV: &str = "OPENROUTESERVICE_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub provider: ProviderConfig,
    pub optimization: OptimizationConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Without a key no remote request is ever issued.
    pub api_key: Option<String>,
    pub profile: String,
    pub timeout_secs: u64,
    /// Minimum spacing between outbound requests.
    pub request_delay_secs: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openrouteservice.org/v2".to_string(),
            api_key: None,
            profile: "foot-walking".to_string(),
            timeout_secs: 30,
            request_delay_secs: 2.0,
        }
    }
}

impl ProviderConfig {
    /// Fills `api_key` from the environment when it is not already set.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
            && !self.base_url.is_empty()
    }

    pub fn request_delay(&self) -> Duration {
        if self.request_delay_secs.is_finite() && self.request_delay_secs > 0.0 {
            Duration::from_secs_f64(self.request_delay_secs)
        } else {
            Duration::ZERO
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub walking_speed_kmh: f64,
    /// Upper bound on 2-opt passes; the effective cap is `min(this, 2n)`.
    pub max_tsp_iterations: usize,
    /// A 2-opt move must shorten the path by more than this many metres.
    pub tsp_improvement_threshold: f64,
    /// Query the road-network provider for matrices when one is configured.
    pub prefer_remote: bool,
    /// Resolve per-edge walking geometry after solving.
    pub resolve_geometry: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            walking_speed_kmh: DEFAULT_WALKING_SPEED_KMH,
            max_tsp_iterations: 50,
            tsp_improvement_threshold: 0.01,
            prefer_remote: true,
            resolve_geometry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Segment cache directory. `None` keeps the cache in memory only.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: Some(PathBuf::from("cache/route_segments")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.provider.profile, "foot-walking");
        assert_eq!(config.provider.request_delay(), Duration::from_secs(2));
        assert_eq!(config.optimization.max_tsp_iterations, 50);
        assert_eq!(config.optimization.walking_speed_kmh, 4.0);
        assert!(!config.provider.is_configured());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlannerConfig = serde_json::from_str(
            r#"{"provider": {"api_key": "secret"}, "optimization": {"walking_speed_kmh": 5.0}}"#,
        )
        .unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert_eq!(config.provider.timeout_secs, 30);
        assert!(config.provider.is_configured());
        assert_eq!(config.optimization.walking_speed_kmh, 5.0);
        assert_eq!(config.optimization.tsp_improvement_threshold, 0.01);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let provider = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..ProviderConfig::default()
        };
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_explicit_key_survives_env_lookup() {
        let provider = ProviderConfig {
            api_key: Some("explicit".to_string()),
            ..ProviderConfig::default()
        }
        .with_env_api_key();
        assert_eq!(provider.api_key.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_negative_delay_clamps_to_zero() {
        let provider = ProviderConfig {
            request_delay_secs: -1.0,
            ..ProviderConfig::default()
        };
        assert_eq!(provider.request_delay(), Duration::ZERO);
    }
}

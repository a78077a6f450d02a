//! Curation configuration.
//!
//! This module provides the options that drive a curation run: which quality
//! metrics are computed, the per-metric bounds, the filtering strategy, the
//! diversity feature set, and execution limits. Every field has a default, so
//! an empty YAML document is a valid configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::quality::Metric;

/// Filtering policy applied to an assessed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum StrategyKind {
    Threshold,
    Percentile,
    Clustering,
    Ensemble,
    Adaptive,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Threshold,
        StrategyKind::Percentile,
        StrategyKind::Clustering,
        StrategyKind::Ensemble,
        StrategyKind::Adaptive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Threshold => "threshold",
            StrategyKind::Percentile => "percentile",
            StrategyKind::Clustering => "clustering",
            StrategyKind::Ensemble => "ensemble",
            StrategyKind::Adaptive => "adaptive",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "threshold" => Ok(StrategyKind::Threshold),
            "percentile" => Ok(StrategyKind::Percentile),
            "clustering" | "cluster" => Ok(StrategyKind::Clustering),
            "ensemble" => Ok(StrategyKind::Ensemble),
            "adaptive" => Ok(StrategyKind::Adaptive),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Feature groups used to describe an image's appearance for redundancy detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityFeature {
    ColorHistogram,
    Texture,
    SpatialMoments,
}

impl DiversityFeature {
    pub const ALL: [DiversityFeature; 3] = [
        DiversityFeature::ColorHistogram,
        DiversityFeature::Texture,
        DiversityFeature::SpatialMoments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiversityFeature::ColorHistogram => "color_histogram",
            DiversityFeature::Texture => "texture",
            DiversityFeature::SpatialMoments => "spatial_moments",
        }
    }
}

impl fmt::Display for DiversityFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiversityFeature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        DiversityFeature::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownFeature(s.to_string()))
    }
}

/// Inclusive acceptance interval for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBounds {
    pub min: f64,
    pub max: f64,
}

impl MetricBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for MetricBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Bounds applied when a configuration does not override them.
pub fn default_bounds() -> BTreeMap<Metric, MetricBounds> {
    Metric::all()
        .into_iter()
        .map(|metric| {
            let bounds = match metric {
                Metric::Brightness => MetricBounds::new(0.1, 0.9),
                Metric::NoiseLevel => MetricBounds::new(0.0, 0.6),
                Metric::BlurLevel => MetricBounds::new(0.0, 0.9),
                Metric::ArtifactLevel => MetricBounds::new(0.0, 0.8),
                Metric::Aesthetic | Metric::Technical | Metric::Naturalness => {
                    MetricBounds::new(0.2, 1.0)
                }
                _ => MetricBounds::default(),
            };
            (metric, bounds)
        })
        .collect()
}

/// Configuration for a curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    // Quality settings
    /// Metrics computed and considered by every strategy.
    pub enabled_metrics: Vec<Metric>,
    /// Per-metric acceptance bounds used by the threshold strategy.
    pub bounds: BTreeMap<Metric, MetricBounds>,
    /// Filtering strategy applied after assessment.
    pub strategy: StrategyKind,
    /// Batch-wide spread above which adaptive filtering clusters.
    pub adaptive_diversity_threshold: f64,
    /// Representative-metric variance above which adaptive filtering ranks by percentile.
    pub adaptive_variance_threshold: f64,

    // Diversity settings
    /// Whether the diversity optimizer runs after filtering.
    pub enable_diversity: bool,
    /// Feature groups concatenated into the diversity embedding.
    pub diversity_features: Vec<DiversityFeature>,
    /// Maximum members kept from each dense cluster.
    pub max_images_per_cluster: usize,
    /// Neighbourhood radius for density clustering.
    pub min_diversity_distance: f64,

    // Execution settings
    /// Maximum images assessed concurrently.
    pub concurrency_limit: usize,
    /// Timeout for one neural scorer call, in milliseconds.
    pub scorer_timeout_ms: u64,
    /// Seed for the clustering strategy's centroid initialization.
    pub seed: u64,
    /// Number of filter reports kept in the run history (0 disables it).
    pub history_capacity: usize,

    // Reserved
    /// Reserved for blending quality and diversity; currently has no effect.
    pub quality_weight: f64,
    /// Reserved for blending quality and diversity; currently has no effect.
    pub diversity_weight: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled_metrics: Metric::PIXEL.to_vec(),
            bounds: default_bounds(),
            strategy: StrategyKind::Ensemble,
            adaptive_diversity_threshold: 0.7,
            adaptive_variance_threshold: 0.5,

            enable_diversity: true,
            diversity_features: DiversityFeature::ALL.to_vec(),
            max_images_per_cluster: 3,
            min_diversity_distance: 0.5,

            concurrency_limit: 4,
            scorer_timeout_ms: 5000,
            seed: 42,
            history_capacity: 32,

            quality_weight: 0.7,
            diversity_weight: 0.3,
        }
    }
}

impl FilterConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a YAML or JSON file, chosen by extension.
    ///
    /// Files without a `.json` extension are parsed as YAML. The result is
    /// validated before it is returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates configuration from environment variables over the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `CURATE_STRATEGY`: Filtering strategy (default: ensemble)
    /// - `CURATE_ENABLED_METRICS`: Comma-separated metric names
    /// - `CURATE_DIVERSITY_FEATURES`: Comma-separated feature groups
    /// - `CURATE_ENABLE_DIVERSITY`: Run the diversity optimizer (default: true)
    /// - `CURATE_MAX_IMAGES_PER_CLUSTER`: Members kept per cluster (default: 3)
    /// - `CURATE_MIN_DIVERSITY_DISTANCE`: Clustering radius (default: 0.5)
    /// - `CURATE_CONCURRENCY_LIMIT`: Concurrent assessments (default: 4)
    /// - `CURATE_SCORER_TIMEOUT_MS`: Neural scorer timeout (default: 5000)
    /// - `CURATE_SEED`: Clustering seed (default: 42)
    /// - `CURATE_HISTORY_CAPACITY`: Reports kept in history (default: 32)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value or the
    /// resulting configuration fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Overlays `CURATE_*` environment variables on this configuration.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Quality settings
        if let Some(val) = lookup("CURATE_STRATEGY") {
            self.strategy = val.parse()?;
        }

        if let Some(val) = lookup("CURATE_ENABLED_METRICS") {
            self.enabled_metrics = parse_list(&val)?;
        }

        // Diversity settings
        if let Some(val) = lookup("CURATE_DIVERSITY_FEATURES") {
            self.diversity_features = parse_list(&val)?;
        }

        if let Some(val) = lookup("CURATE_ENABLE_DIVERSITY") {
            self.enable_diversity = parse_env_bool(&val, "CURATE_ENABLE_DIVERSITY")?;
        }

        if let Some(val) = lookup("CURATE_MAX_IMAGES_PER_CLUSTER") {
            self.max_images_per_cluster = parse_env_value(&val, "CURATE_MAX_IMAGES_PER_CLUSTER")?;
        }

        if let Some(val) = lookup("CURATE_MIN_DIVERSITY_DISTANCE") {
            self.min_diversity_distance = parse_env_value(&val, "CURATE_MIN_DIVERSITY_DISTANCE")?;
        }

        // Execution settings
        if let Some(val) = lookup("CURATE_CONCURRENCY_LIMIT") {
            self.concurrency_limit = parse_env_value(&val, "CURATE_CONCURRENCY_LIMIT")?;
        }

        if let Some(val) = lookup("CURATE_SCORER_TIMEOUT_MS") {
            self.scorer_timeout_ms = parse_env_value(&val, "CURATE_SCORER_TIMEOUT_MS")?;
        }

        if let Some(val) = lookup("CURATE_SEED") {
            self.seed = parse_env_value(&val, "CURATE_SEED")?;
        }

        if let Some(val) = lookup("CURATE_HISTORY_CAPACITY") {
            self.history_capacity = parse_env_value(&val, "CURATE_HISTORY_CAPACITY")?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBounds` for a bound with `min > max`, and
    /// `ConfigError::ValidationFailed` for any other out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Quality validation
        if self.enabled_metrics.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "enabled_metrics cannot be empty".to_string(),
            ));
        }

        for (&metric, bounds) in &self.bounds {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return Err(ConfigError::InvalidValue {
                    key: format!("bounds.{}", metric),
                    message: "bounds must be finite".to_string(),
                });
            }
            if bounds.min > bounds.max {
                return Err(ConfigError::InvalidBounds {
                    metric,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }

        if !self.adaptive_diversity_threshold.is_finite() || self.adaptive_diversity_threshold < 0.0
        {
            return Err(ConfigError::ValidationFailed(
                "adaptive_diversity_threshold must be a non-negative number".to_string(),
            ));
        }

        if !self.adaptive_variance_threshold.is_finite() || self.adaptive_variance_threshold < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "adaptive_variance_threshold must be a non-negative number".to_string(),
            ));
        }

        // Diversity validation
        if self.max_images_per_cluster == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_images_per_cluster must be greater than 0".to_string(),
            ));
        }

        if !self.min_diversity_distance.is_finite() || self.min_diversity_distance <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "min_diversity_distance must be greater than 0".to_string(),
            ));
        }

        if self.enable_diversity && self.diversity_features.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "diversity_features cannot be empty when diversity is enabled".to_string(),
            ));
        }

        // Execution validation
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency_limit must be greater than 0".to_string(),
            ));
        }

        if self.scorer_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "scorer_timeout_ms must be greater than 0".to_string(),
            ));
        }

        // Reserved
        if !(0.0..=1.0).contains(&self.quality_weight) {
            return Err(ConfigError::ValidationFailed(
                "quality_weight must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.diversity_weight) {
            return Err(ConfigError::ValidationFailed(
                "diversity_weight must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Bounds for `metric`, falling back to `[0, 1]`.
    pub fn bounds_for(&self, metric: Metric) -> MetricBounds {
        self.bounds.get(&metric).copied().unwrap_or_default()
    }

    pub fn scorer_timeout(&self) -> Duration {
        Duration::from_millis(self.scorer_timeout_ms)
    }

    /// Builder method to set the enabled metrics.
    pub fn with_enabled_metrics(mut self, metrics: impl IntoIterator<Item = Metric>) -> Self {
        self.enabled_metrics = metrics.into_iter().collect();
        self
    }

    /// Builder method to set one metric's bounds.
    pub fn with_bounds(mut self, metric: Metric, min: f64, max: f64) -> Self {
        self.bounds.insert(metric, MetricBounds::new(min, max));
        self
    }

    /// Builder method to set the filtering strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Builder method to set the adaptive decision thresholds.
    pub fn with_adaptive_thresholds(mut self, diversity: f64, variance: f64) -> Self {
        self.adaptive_diversity_threshold = diversity;
        self.adaptive_variance_threshold = variance;
        self
    }

    /// Builder method to enable or disable diversity optimization.
    pub fn with_diversity(mut self, enabled: bool) -> Self {
        self.enable_diversity = enabled;
        self
    }

    /// Builder method to set the diversity feature groups.
    pub fn with_diversity_features(
        mut self,
        features: impl IntoIterator<Item = DiversityFeature>,
    ) -> Self {
        self.diversity_features = features.into_iter().collect();
        self
    }

    /// Builder method to set the per-cluster cap.
    pub fn with_max_images_per_cluster(mut self, max: usize) -> Self {
        self.max_images_per_cluster = max;
        self
    }

    /// Builder method to set the clustering radius.
    pub fn with_min_diversity_distance(mut self, distance: f64) -> Self {
        self.min_diversity_distance = distance;
        self
    }

    /// Builder method to set the assessment concurrency.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Builder method to set the neural scorer timeout.
    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Builder method to set the clustering seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the history capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

/// Parse a comma-separated list, skipping empty entries.
fn parse_list<T: FromStr<Err = ConfigError>>(value: &str) -> Result<Vec<T>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.enabled_metrics, Metric::PIXEL.to_vec());
        assert_eq!(config.strategy, StrategyKind::Ensemble);
        assert_eq!(config.max_images_per_cluster, 3);
        assert!((config.min_diversity_distance - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.concurrency_limit, 4);
        assert_eq!(config.scorer_timeout(), Duration::from_secs(5));
        assert_eq!(config.bounds_for(Metric::Brightness), MetricBounds::new(0.1, 0.9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = FilterConfig::new()
            .with_enabled_metrics([Metric::Brightness, Metric::Contrast])
            .with_bounds(Metric::Contrast, 0.2, 0.8)
            .with_strategy(StrategyKind::Percentile)
            .with_diversity(false)
            .with_max_images_per_cluster(2)
            .with_min_diversity_distance(1.5)
            .with_concurrency_limit(8)
            .with_scorer_timeout(Duration::from_millis(250))
            .with_seed(7);

        assert_eq!(config.enabled_metrics.len(), 2);
        assert_eq!(config.bounds_for(Metric::Contrast), MetricBounds::new(0.2, 0.8));
        assert_eq!(config.strategy, StrategyKind::Percentile);
        assert!(!config.enable_diversity);
        assert_eq!(config.max_images_per_cluster, 2);
        assert_eq!(config.concurrency_limit, 8);
        assert_eq!(config.scorer_timeout_ms, 250);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_validation_inverted_bounds() {
        let err = FilterConfig::default()
            .with_bounds(Metric::Sharpness, 0.9, 0.1)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidBounds {
                metric: Metric::Sharpness,
                ..
            }
        ));
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let err = FilterConfig::default()
            .with_concurrency_limit(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("concurrency_limit"));

        let err = FilterConfig::default()
            .with_max_images_per_cluster(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("max_images_per_cluster"));

        let err = FilterConfig::default()
            .with_min_diversity_distance(0.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("min_diversity_distance"));

        let err = FilterConfig::default()
            .with_enabled_metrics([])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("enabled_metrics"));
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("Percentile".parse::<StrategyKind>().unwrap(), StrategyKind::Percentile);
        assert_eq!(" adaptive ".parse::<StrategyKind>().unwrap(), StrategyKind::Adaptive);
        assert!(matches!(
            "best-effort".parse::<StrategyKind>(),
            Err(ConfigError::UnknownStrategy(name)) if name == "best-effort"
        ));
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_feature_parsing() {
        assert_eq!(
            "color-histogram".parse::<DiversityFeature>().unwrap(),
            DiversityFeature::ColorHistogram
        );
        assert!(matches!(
            "edges".parse::<DiversityFeature>(),
            Err(ConfigError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_yaml_partial_config_keeps_defaults() {
        let yaml = r#"
strategy: threshold
enabled_metrics: [brightness, contrast]
bounds:
  brightness: { min: 0.2, max: 0.8 }
max_images_per_cluster: 2
"#;
        let config = FilterConfig::from_yaml_str(yaml).expect("valid yaml");
        assert_eq!(config.strategy, StrategyKind::Threshold);
        assert_eq!(config.enabled_metrics, vec![Metric::Brightness, Metric::Contrast]);
        assert_eq!(config.bounds_for(Metric::Brightness), MetricBounds::new(0.2, 0.8));
        assert_eq!(config.max_images_per_cluster, 2);
        assert_eq!(config.concurrency_limit, 4);
    }

    #[test]
    fn test_yaml_unknown_strategy_fails() {
        let err = FilterConfig::from_yaml_str("strategy: magic\n").unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_yaml_inverted_bounds_fail() {
        let yaml = "bounds:\n  contrast: { min: 0.8, max: 0.2 }\n";
        assert!(matches!(
            FilterConfig::from_yaml_str(yaml),
            Err(ConfigError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = tempfile::tempdir().expect("tempdir");

        let json_path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&json_path).expect("create");
        write!(file, r#"{{"strategy": "clustering", "seed": 9}}"#).expect("write");
        let config = FilterConfig::from_file(&json_path).expect("json config");
        assert_eq!(config.strategy, StrategyKind::Clustering);
        assert_eq!(config.seed, 9);

        let yaml_path = dir.path().join("config.yaml");
        std::fs::write(&yaml_path, "enable_diversity: false\n").expect("write");
        let config = FilterConfig::from_file(&yaml_path).expect("yaml config");
        assert!(!config.enable_diversity);

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            FilterConfig::from_file(missing),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = FilterConfig::default()
            .with_overrides(lookup(&[
                ("CURATE_STRATEGY", "threshold"),
                ("CURATE_ENABLED_METRICS", "brightness, sharpness"),
                ("CURATE_ENABLE_DIVERSITY", "off"),
                ("CURATE_CONCURRENCY_LIMIT", "2"),
                ("CURATE_SEED", "11"),
            ]))
            .expect("valid overrides");

        assert_eq!(config.strategy, StrategyKind::Threshold);
        assert_eq!(config.enabled_metrics, vec![Metric::Brightness, Metric::Sharpness]);
        assert!(!config.enable_diversity);
        assert_eq!(config.concurrency_limit, 2);
        assert_eq!(config.seed, 11);
    }

    #[test]
    fn test_env_invalid_values() {
        let err = FilterConfig::default()
            .with_overrides(lookup(&[("CURATE_CONCURRENCY_LIMIT", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("CURATE_CONCURRENCY_LIMIT"));

        let err = FilterConfig::default()
            .with_overrides(lookup(&[("CURATE_ENABLED_METRICS", "brightness,glow")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownMetric(_)));

        let err = FilterConfig::default()
            .with_overrides(lookup(&[("CURATE_CONCURRENCY_LIMIT", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("1", "test").unwrap());
        assert!(parse_env_bool("YES", "test").unwrap());
        assert!(!parse_env_bool("off", "test").unwrap());
        assert!(parse_env_bool("maybe", "test").is_err());
    }

    #[test]
    fn test_serialized_config_round_trips_through_yaml() {
        let config = FilterConfig::default().with_strategy(StrategyKind::Adaptive);
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        assert!(yaml.contains("strategy: adaptive"));
        let parsed = FilterConfig::from_yaml_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }
}

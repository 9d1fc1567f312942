//! Process-wide configuration, loaded once at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::ChatConfig;
use crate::error::ConfigError;
use crate::metrics::DEFAULT_WALKING_SPEED_MPS;
use crate::postgrest::PostgrestConfig;
use crate::retry::RetryPolicy;
use crate::vocabulary::LandmarkVocabulary;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub chat: ChatConfig,
    pub routing: PostgrestConfig,
}

impl Config {
    /// Reads a YAML file. Missing sections and keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.pipeline.validate()?;
        Ok(config)
    }
}

/// Constants of the search pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fixed weight of landmarks; the other seven weights share the rest.
    pub landmarks_weight: f64,
    /// Accepted difference between generated weight sum and budget.
    pub weight_tolerance: f64,
    pub route_attempts: usize,
    pub explanation_attempts: usize,
    /// Nominal pause between retry attempts, jittered.
    pub retry_delay_ms: u64,
    pub walking_speed_mps: f64,
    /// Size of the worker pool running external calls.
    pub worker_threads: usize,
    /// Reject explanations whose texts miss the character bounds.
    pub strict_explanation_bounds: bool,
    /// Landmark vocabulary file; the built-in list is used when unset.
    pub vocabulary_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            landmarks_weight: 0.2,
            weight_tolerance: 1e-3,
            route_attempts: 5,
            explanation_attempts: 5,
            retry_delay_ms: 200,
            walking_speed_mps: DEFAULT_WALKING_SPEED_MPS,
            worker_threads: 4,
            strict_explanation_bounds: false,
            vocabulary_path: std::env::var("ROUTE_FINDER_VOCABULARY").ok().map(PathBuf::from),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.landmarks_weight) {
            return Err(ConfigError::Invalid(format!(
                "landmarks_weight must be in [0, 1), got {}",
                self.landmarks_weight
            )));
        }
        if !self.weight_tolerance.is_finite() || self.weight_tolerance < 0.0 {
            return Err(ConfigError::Invalid("weight_tolerance must be a non-negative number".to_string()));
        }
        if self.route_attempts == 0 || self.explanation_attempts == 0 {
            return Err(ConfigError::Invalid("retry attempts must be at least 1".to_string()));
        }
        if !self.walking_speed_mps.is_finite() || self.walking_speed_mps <= 0.0 {
            return Err(ConfigError::Invalid("walking_speed_mps must be positive".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn route_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.route_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn explanation_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.explanation_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn vocabulary(&self) -> Result<LandmarkVocabulary, ConfigError> {
        match &self.vocabulary_path {
            Some(path) => LandmarkVocabulary::from_file(path),
            None => Ok(LandmarkVocabulary::builtin()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.route_policy().max_attempts, 5);
        assert_eq!(config.explanation_policy().delay, Duration::from_millis(200));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            PipelineConfig { landmarks_weight: 1.0, ..PipelineConfig::default() },
            PipelineConfig { landmarks_weight: -0.1, ..PipelineConfig::default() },
            PipelineConfig { route_attempts: 0, ..PipelineConfig::default() },
            PipelineConfig { walking_speed_mps: 0.0, ..PipelineConfig::default() },
            PipelineConfig { worker_threads: 0, ..PipelineConfig::default() },
            PipelineConfig { weight_tolerance: f64::NAN, ..PipelineConfig::default() },
        ];
        for case in cases {
            assert!(matches!(case.validate(), Err(ConfigError::Invalid(_))), "{case:?}");
        }
    }

    #[test]
    fn test_load_yaml_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "pipeline:\n  landmarks_weight: 0.3\n  route_attempts: 3\nchat:\n  url: http://llm.internal:8000\n  model: test-model\nrouting:\n  base_url: http://engine.internal:3000"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.pipeline.landmarks_weight, 0.3);
        assert_eq!(config.pipeline.route_attempts, 3);
        assert_eq!(config.pipeline.explanation_attempts, 5);
        assert_eq!(config.chat.url, "http://llm.internal:8000");
        assert_eq!(config.chat.model, "test-model");
        assert_eq!(config.routing.base_url, "http://engine.internal:3000");
        assert_eq!(config.routing.function, "generate_route");
    }

    #[test]
    fn test_load_rejects_invalid_pipeline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipeline:\n  landmarks_weight: 1.5").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_vocabulary_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "museum, cafe").unwrap();
        let config = PipelineConfig {
            vocabulary_path: Some(file.path().to_path_buf()),
            ..PipelineConfig::default()
        };
        assert_eq!(config.vocabulary().unwrap().len(), 2);
    }
}

//! Configuration management for the issue labeling worker.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::error::{CoreError, CoreResult};
use crate::models::{
    ClassThresholds, DEFAULT_CLASS_NAMES, DEFAULT_CLASS_THRESHOLD, DEFAULT_ORG_MIN_SCORE,
    QUESTION_CLASS_THRESHOLD,
};
use crate::repo_config::DEFAULT_MODEL_BUCKET;
use crate::types::LabelName;

/// Environment variable selecting `config/{env}.toml`.
pub const ENV_SELECTOR: &str = "ISSUE_LABEL_ENV";

/// Prefix of overriding environment variables, e.g. `ISSUE_LABEL__GITHUB__TOKEN`.
pub const ENV_PREFIX: &str = "ISSUE_LABEL";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub pubsub: PubSubConfig,
    pub github: GithubConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub models: ModelsConfig,
    /// Floors used by the `calibrate` subcommand of the worker binary.
    pub calibration: CalibrationConfig,
    pub worker: WorkerConfig,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Configuration is loaded in order:
    /// 1. config/default.toml (base settings)
    /// 2. config/{ISSUE_LABEL_ENV}.toml (environment-specific)
    /// 3. Environment variables with ISSUE_LABEL__ prefix
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values. FAIL FAST on the first violation.
    pub fn validate(&self) -> CoreResult<()> {
        if !matches!(self.logging.format.as_str(), "pretty" | "compact" | "json") {
            return Err(CoreError::ConfigError(format!(
                "logging.format must be pretty, compact or json, got {}",
                self.logging.format
            )));
        }

        if self.pubsub.max_outstanding_messages != 1 {
            return Err(CoreError::ConfigError(format!(
                "pubsub.max_outstanding_messages must be 1, got {}",
                self.pubsub.max_outstanding_messages
            )));
        }

        if self.embedding.dimension == 0 {
            return Err(CoreError::ConfigError(
                "embedding.dimension must be greater than 0".into(),
            ));
        }

        if self.embedding.request_timeout_secs == 0 {
            return Err(CoreError::ConfigError(
                "embedding.request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.worker.processing_timeout_secs == Some(0) {
            return Err(CoreError::ConfigError(
                "worker.processing_timeout_secs must be greater than 0 when set".into(),
            ));
        }

        self.models.validate()?;
        self.calibration.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            include_location: false,
        }
    }
}

/// Queue subscription settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PubSubConfig {
    pub api_base: String,
    pub project_id: String,
    pub subscription: String,
    /// Flow-control limit. Only 1 is accepted.
    pub max_outstanding_messages: usize,
    /// Wait between empty pulls.
    pub poll_interval_ms: u64,
    pub access_token: Option<String>,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://pubsub.googleapis.com/v1".to_string(),
            project_id: String::new(),
            subscription: String::new(),
            max_outstanding_messages: 1,
            poll_interval_ms: 1000,
            access_token: None,
        }
    }
}

impl PubSubConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub token: Option<String>,
    /// Base URL of the prediction dashboard linked from comments.
    pub app_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: None,
            app_url: "https://label-bot-prod.mlbot.net/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://embeddings.gh-issue-labeler.com/text".to_string(),
            api_key: None,
            dimension: 1600,
            request_timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub api_base: String,
    pub model_bucket: String,
    /// Local directory receiving downloaded repo artifacts.
    pub local_dir: PathBuf,
    pub access_token: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            api_base: "https://storage.googleapis.com".to_string(),
            model_bucket: DEFAULT_MODEL_BUCKET.to_string(),
            local_dir: PathBuf::from("./data/models"),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrgModelConfig {
    pub org: String,
    pub endpoint: String,
    #[serde(default = "default_org_min_score")]
    pub min_score: f32,
}

fn default_org_min_score() -> f32 {
    DEFAULT_ORG_MIN_SCORE
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepoModelConfig {
    pub owner: String,
    pub repo: String,
}

/// Static model list the registry is built from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub universal_endpoint: String,
    pub class_names: Vec<LabelName>,
    pub default_threshold: f32,
    pub label_thresholds: HashMap<LabelName, f32>,
    pub org_models: Vec<OrgModelConfig>,
    pub repo_models: Vec<RepoModelConfig>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let mut label_thresholds = HashMap::new();
        label_thresholds.insert("question".to_string(), QUESTION_CLASS_THRESHOLD);
        Self {
            universal_endpoint: "http://localhost:8080/universal".to_string(),
            class_names: DEFAULT_CLASS_NAMES.iter().map(|c| c.to_string()).collect(),
            default_threshold: DEFAULT_CLASS_THRESHOLD,
            label_thresholds,
            org_models: Vec::new(),
            repo_models: Vec::new(),
        }
    }
}

impl ModelsConfig {
    pub fn class_thresholds(&self) -> ClassThresholds {
        ClassThresholds {
            default: self.default_threshold,
            per_label: self.label_thresholds.clone(),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.class_names.is_empty() {
            return Err(CoreError::ConfigError(
                "models.class_names must not be empty".into(),
            ));
        }

        let unit = |name: &str, value: f32| -> CoreResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(CoreError::ConfigError(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        };

        unit("models.default_threshold", self.default_threshold)?;
        for (label, threshold) in &self.label_thresholds {
            unit(&format!("models.label_thresholds.{}", label), *threshold)?;
        }

        let mut seen = std::collections::HashSet::new();
        for org in &self.org_models {
            unit(&format!("models.org_models[{}].min_score", org.org), org.min_score)?;
            if org.org.is_empty() || !seen.insert(org.org.as_str()) {
                return Err(CoreError::ConfigError(format!(
                    "models.org_models has an empty or duplicate org: '{}'",
                    org.org
                )));
            }
        }

        for repo in &self.repo_models {
            if repo.owner.is_empty() || repo.repo.is_empty() {
                return Err(CoreError::ConfigError(
                    "models.repo_models entries need owner and repo".into(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Upper bound on one message's processing. Unset means no bound.
    pub processing_timeout_secs: Option<u64>,
}

impl WorkerConfig {
    pub fn processing_timeout(&self) -> Option<Duration> {
        self.processing_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.embedding.dimension, 1600);
        assert_eq!(config.pubsub.max_outstanding_messages, 1);
        assert_eq!(config.storage.model_bucket, "repo-models");
        assert_eq!(config.models.class_names, vec!["bug", "feature", "question"]);
        assert!(config.worker.processing_timeout().is_none());
    }

    #[test]
    fn test_validation_passes() {
        assert!(Config::default_config().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_concurrent_flow_control() {
        let mut config = Config::default_config();
        config.pubsub.max_outstanding_messages = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_dimension() {
        let mut config = Config::default_config();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = Config::default_config();
        config.worker.processing_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        config.worker.processing_timeout_secs = Some(30);
        assert!(config.validate().is_ok());
        assert_eq!(config.worker.processing_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validation_rejects_bad_thresholds() {
        let mut config = Config::default_config();
        config.models.label_thresholds.insert("bug".into(), 1.5);
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.calibration.recall_floor = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_org() {
        let mut config = Config::default_config();
        let org = OrgModelConfig {
            org: "kubeflow".into(),
            endpoint: "http://automl/kubeflow".into(),
            min_score: 0.5,
        };
        config.models.org_models = vec![org.clone(), org];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_class_thresholds_from_config() {
        let thresholds = Config::default_config().models.class_thresholds();
        assert_eq!(thresholds, ClassThresholds::default());
    }

    #[test]
    fn test_config_from_toml_string() {
        let toml_str = r#"
[logging]
level = "debug"
format = "json"

[pubsub]
project_id = "issue-label-bot-dev"
subscription = "label_bot_prod"

[github]
app_url = "https://label-bot.example.com/"

[models]
universal_endpoint = "http://universal:8080/predict"
default_threshold = 0.5

[models.label_thresholds]
question = 0.65

[[models.org_models]]
org = "kubeflow"
endpoint = "http://automl:8080/kubeflow"

[[models.repo_models]]
owner = "kubeflow"
repo = "kubeflow"

[worker]
processing_timeout_secs = 120
"#;
        let config: Config = toml::from_str(toml_str).expect("config must parse");
        config.validate().expect("config must validate");

        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.include_location);
        assert_eq!(config.pubsub.subscription, "label_bot_prod");
        assert_eq!(config.pubsub.max_outstanding_messages, 1);
        assert_eq!(config.embedding.dimension, 1600);
        assert_eq!(config.models.org_models[0].min_score, DEFAULT_ORG_MIN_SCORE);
        assert_eq!(config.models.repo_models[0].repo, "kubeflow");
        assert_eq!(config.models.class_thresholds().threshold_for("question"), 0.65);
        assert_eq!(config.models.class_thresholds().threshold_for("bug"), 0.5);
        assert_eq!(config.worker.processing_timeout_secs, Some(120));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.toml");
        std::fs::write(&path, "[embedding]\ndimension = 800\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.embedding.dimension, 800);

        std::fs::write(&path, "[embedding]\ndimension = 0\n").unwrap();
        assert!(Config::from_file(&path).is_err());
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let mut config = Config::default_config();
        config.models.org_models.push(OrgModelConfig {
            org: "kubeflow".into(),
            endpoint: "http://automl".into(),
            min_score: 0.4,
        });

        let toml_str = toml::to_string(&config).expect("Config must serialize to TOML");
        let restored: Config = toml::from_str(&toml_str).expect("Config must deserialize");

        assert_eq!(restored.models.org_models, config.models.org_models);
        assert_eq!(restored.models.class_names, config.models.class_names);
        assert_eq!(restored.storage.local_dir, config.storage.local_dir);
    }
}

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "AMSILENCE_";

/// Where and how commands are executed against the Alertmanager replicas.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_container")]
    pub container: String,

    /// Pods tried in order until one succeeds.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_check_exit_status")]
    pub check_exit_status: bool,

    #[serde(default)]
    pub exec_timeout_secs: Option<u64>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug, PartialEq, Eq)]
pub struct PartialExecConfig {
    pub namespace: Option<String>,
    pub container: Option<String>,
    pub targets: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub check_exit_status: Option<bool>,
    pub exec_timeout_secs: Option<u64>,
}

fn default_namespace() -> String {
    "openshift-monitoring".to_string()
}

fn default_container() -> String {
    "alertmanager".to_string()
}

fn default_targets() -> Vec<String> {
    vec![
        "alertmanager-main-0".to_string(),
        "alertmanager-main-1".to_string(),
    ]
}

fn default_base_url() -> String {
    "http://localhost:9093".to_string()
}

fn default_check_exit_status() -> bool {
    true
}

// `AMSILENCE_TARGETS="a, b,"` arrives as ["a", " b", ""]
fn normalize_targets(targets: Vec<String>) -> Vec<String> {
    targets
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            container: default_container(),
            targets: default_targets(),
            base_url: default_base_url(),
            check_exit_status: default_check_exit_status(),
            exec_timeout_secs: None,
        }
    }
}

impl PartialExecConfig {
    /// Reads `AMSILENCE_*` overrides from the given pairs. Unrelated keys are ignored.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }
}

impl ExecConfig {
    /// Loads the config: defaults, then the TOML file (if it exists), then environment overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_with_env(config_path, PartialExecConfig::from_env()?)
    }

    /// Same as [`ExecConfig::load`] with the environment layer supplied by the caller.
    pub fn load_with_env(
        config_path: Option<&str>,
        env_config: PartialExecConfig,
    ) -> Result<Self, ConfigError> {
        // 1. Load from file (optional)
        let file_config: PartialExecConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|e| ConfigError::Read {
                    path: path_str.to_string(),
                    source: e,
                })?;
                toml::from_str(&contents)?
            }
            _ => PartialExecConfig::default(),
        };

        // 2. Merge: environment overrides file
        let config = Self::from_layers(file_config, env_config)?;
        info!(
            namespace = %config.namespace,
            container = %config.container,
            targets = ?config.targets,
            "Loaded exec config."
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ExecConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_layers(
        file: PartialExecConfig,
        env: PartialExecConfig,
    ) -> Result<Self, ConfigError> {
        let config = ExecConfig {
            namespace: env
                .namespace
                .or(file.namespace)
                .unwrap_or_else(default_namespace),
            container: env
                .container
                .or(file.container)
                .unwrap_or_else(default_container),
            targets: env
                .targets
                .or(file.targets)
                .map(normalize_targets)
                .unwrap_or_else(default_targets),
            base_url: env
                .base_url
                .or(file.base_url)
                .unwrap_or_else(default_base_url),
            check_exit_status: env
                .check_exit_status
                .or(file.check_exit_status)
                .unwrap_or_else(default_check_exit_status),
            exec_timeout_secs: env.exec_timeout_secs.or(file.exec_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".to_string()));
        }
        if self.container.trim().is_empty() {
            return Err(ConfigError::Invalid("container must not be empty".to_string()));
        }
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one target pod is required".to_string(),
            ));
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "target pod names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Joins the Alertmanager base URL with an API path, e.g. `/api/v2/silences`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

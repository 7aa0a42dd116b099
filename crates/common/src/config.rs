//! Operator configuration.
//!
//! Settings live in `~/.dmesh/config.yaml` as named profiles:
//!
//! ```yaml
//! current_profile: gov
//! profiles:
//!   gov:
//!     aws_region: us-gov-west-1
//!     aws_account_id: "123456789012"
//!     default_role: DataAnalyst
//! ```
//!
//! Profile selection: CLI argument > `DMESH_PROFILE` > `current_profile` > `default`.
//! Individual fields can then be overridden with `DATAMESH_*` environment variables.

use dmesh_error::{Coded, ErrorCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

// Default constants
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_PROFILE_NAME: &str = "default";
pub const DEFAULT_BROKER_PROGRAM: &str = "aws";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const CONFIG_DIR_NAME: &str = ".dmesh";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Prefix for per-field environment overrides.
pub const ENV_PREFIX: &str = "DATAMESH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration validation failed: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl Coded for ConfigError {
    fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Read { .. } => ErrorCode::ConfigUnreadable,
            ConfigError::Parse { .. } => ErrorCode::InvalidYaml,
            ConfigError::Invalid(_) => ErrorCode::InvalidConfig,
        }
    }

    fn hint(&self) -> Option<String> {
        Some(format!("Check {}", config_path().display()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Validate)]
pub struct MeshConfig {
    #[serde(default = "default_region")]
    #[validate(length(min = 1))]
    pub aws_region: String,

    /// Named AWS credential profile; first in the credential precedence chain.
    #[serde(default)]
    pub aws_profile: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_account_id"))]
    pub aws_account_id: Option<String>,

    /// Role requested from the SSO broker until another one is assumed.
    #[serde(default)]
    pub default_role: Option<String>,

    #[serde(default)]
    pub credentials: CredentialSettings,

    #[serde(default)]
    #[validate(nested)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            aws_region: default_region(),
            aws_profile: None,
            aws_account_id: None,
            default_role: None,
            credentials: CredentialSettings::default(),
            catalog: CatalogSettings::default(),
            engine: EngineSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CredentialSettings {
    /// Directory holding cached SSO tokens. Defaults to `~/.aws/sso/cache`.
    #[serde(default)]
    pub sso_cache_dir: Option<PathBuf>,

    /// Executable used for the `sso get-role-credentials` exchange.
    #[serde(default = "default_broker_program")]
    pub broker_program: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            sso_cache_dir: None,
            broker_program: default_broker_program(),
        }
    }
}

impl CredentialSettings {
    pub fn resolve_sso_cache_dir(&self) -> Option<PathBuf> {
        self.sso_cache_dir.clone().or_else(|| {
            dirs::home_dir().map(|home| home.join(".aws").join("sso").join("cache"))
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Validate)]
pub struct CatalogSettings {
    /// Endpoint override for the metadata catalog (e.g. a local emulator).
    #[serde(default)]
    #[validate(url)]
    pub endpoint_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EngineSettings {
    /// Run `INSTALL` before `LOAD` for engine extensions.
    #[serde(default = "default_true")]
    pub install_extensions: bool,

    /// Load the remote-storage extension and push credentials into each session.
    #[serde(default = "default_true")]
    pub object_storage: bool,

    #[serde(default)]
    pub memory_limit_mb: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            install_extensions: true,
            object_storage: true,
            memory_limit_mb: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoggingSettings {
    /// Console filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Rolling log directory. Defaults to `~/.dmesh/logs`.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub file_logging: bool,

    /// Write `audit` events to `audit.jsonl`.
    #[serde(default = "default_true")]
    pub audit: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_logging: true,
            audit: true,
        }
    }
}

impl LoggingSettings {
    pub fn resolve_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| config_dir().map(|dir| dir.join("logs")))
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_broker_program() -> String {
    DEFAULT_BROKER_PROGRAM.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_true() -> bool {
    true
}

fn validate_account_id(account_id: &str) -> Result<(), validator::ValidationError> {
    if account_id.len() == 12 && account_id.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("account_id_must_be_12_digits"))
    }
}

#[derive(Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    current_profile: Option<String>,
    #[serde(default)]
    profiles: HashMap<String, MeshConfig>,
}

impl MeshConfig {
    /// Load the active profile from the default config path, then apply
    /// environment overrides and validate.
    pub fn load(profile_arg: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_from(&config_path(), profile_arg)
    }

    pub fn load_from(path: &Path, profile_arg: Option<&str>) -> Result<Self, ConfigError> {
        let content = if path.exists() {
            Some(fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            None
        };

        let mut config = match content {
            Some(content) => Self::from_yaml_str(&content, profile_arg).map_err(|source| {
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?,
            None => MeshConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Select a profile from a config document. Unknown profiles fall back to defaults.
    pub fn from_yaml_str(content: &str, profile_arg: Option<&str>) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };

        let profile_name = profile_arg
            .map(|s| s.to_string())
            .or_else(|| env::var("DMESH_PROFILE").ok())
            .or(config_file.current_profile)
            .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string());

        Ok(config_file
            .profiles
            .get(&profile_name)
            .cloned()
            .unwrap_or_default())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(region) = env_override("AWS_REGION") {
            self.aws_region = region;
        }
        if let Some(profile) = env_override("AWS_PROFILE") {
            self.aws_profile = Some(profile);
        }
        if let Some(account_id) = env_override("AWS_ACCOUNT_ID") {
            self.aws_account_id = Some(account_id);
        }
        if let Some(role) = env_override("DEFAULT_ROLE") {
            self.default_role = Some(role);
        }
    }
}

fn env_override(field: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, field))
        .ok()
        .filter(|v| !v.is_empty())
}

/// `~/.dmesh`, when a home directory exists.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var("DMESH_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

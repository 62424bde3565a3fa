//! Configuration for the math expert.
//!
//! Provides [`AwsConfig`] for choosing how AWS credentials are obtained and
//! [`Settings`] for the application-wide values read from the environment.
//! Both are plain values: build them once and pass them to whatever needs them.
//!
//! # Example
//!
//! ```rust
//! use mathexpert::config::{AwsConfig, CredentialSource};
//!
//! let config = AwsConfig::default()
//!     .with_region("eu-west-1")
//!     .with_profile_name("analytics");
//!
//! assert_eq!(
//!     config.credential_source(),
//!     CredentialSource::Profile { name: "analytics".into() }
//! );
//! ```

use crate::mathexpert::model_params::TokenLimit;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("unknown model '{0}'")]
    UnknownModel(String),
}

/// Access key pair used directly or as the base identity for an assumed role.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeys")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

/// Where the AWS credentials for a session come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Exchange `base` (or the default chain when `None`) for temporary
    /// credentials of `role_arn`.
    AssumeRole {
        role_arn: String,
        base: Option<StaticKeys>,
    },
    /// Named profile from the shared config/credentials files.
    Profile { name: String },
    /// Long-lived access keys.
    StaticKeys(StaticKeys),
    /// Whatever the SDK's default provider chain finds.
    DefaultChain,
}

/// AWS settings for the model client.
///
/// Every field is optional; [`credential_source`](Self::credential_source)
/// decides which of them take effect.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AwsConfig {
    /// Role ARN to assume. Takes precedence over everything else.
    pub assume_role: Option<String>,
    pub region: Option<String>,
    pub profile_name: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsConfig")
            .field("assume_role", &self.assume_role)
            .field("region", &self.region)
            .field("profile_name", &self.profile_name)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

impl AwsConfig {
    /// Read `AWS_ASSUME_ROLE`, `AWS_REGION`, `AWS_PROFILE_NAME`,
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    ///
    /// Empty values and the literals `False`/`false` count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).and_then(non_empty);
        Self {
            assume_role: read("AWS_ASSUME_ROLE"),
            region: read("AWS_REGION"),
            profile_name: read("AWS_PROFILE_NAME"),
            access_key_id: read("AWS_ACCESS_KEY_ID"),
            secret_access_key: read("AWS_SECRET_ACCESS_KEY"),
        }
    }

    pub fn with_assume_role(mut self, role_arn: impl Into<String>) -> Self {
        self.assume_role = Some(role_arn.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile_name(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }

    pub fn with_static_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Both halves of the key pair, if both are set.
    pub fn static_keys(&self) -> Option<StaticKeys> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticKeys {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            }),
            _ => None,
        }
    }

    /// Precedence: assumed role > named profile > static keys > default chain.
    pub fn credential_source(&self) -> CredentialSource {
        if let Some(role_arn) = &self.assume_role {
            return CredentialSource::AssumeRole {
                role_arn: role_arn.clone(),
                base: self.static_keys(),
            };
        }
        if let Some(name) = &self.profile_name {
            return CredentialSource::Profile { name: name.clone() };
        }
        match self.static_keys() {
            Some(keys) => CredentialSource::StaticKeys(keys),
            None => CredentialSource::DefaultChain,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "False" || trimmed == "false" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Application settings resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Deployment environment name; selects `env/<environment>/.env`.
    pub environment: String,
    /// Verbose model output and debug-level logging.
    pub debug: bool,
    pub aws: AwsConfig,
    /// Output budget for each model call.
    pub max_tokens: TokenLimit,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Settings::DEFAULT_ENVIRONMENT.to_string(),
            debug: false,
            aws: AwsConfig::default(),
            max_tokens: Settings::DEFAULT_MAX_TOKENS,
        }
    }
}

impl Settings {
    pub const DEFAULT_ENVIRONMENT: &'static str = "local";
    pub const DEFAULT_MAX_TOKENS: TokenLimit = TokenLimit::Small;

    /// Load settings relative to the current directory.
    ///
    /// See [`load_from`](Self::load_from).
    pub fn load() -> Result<Self, ConfigError> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(&base_dir)
    }

    /// Read `ENVIRONMENT` (default `local`), load `env/<ENVIRONMENT>/.env`
    /// under `base_dir` when it exists, then read the remaining settings from
    /// the process environment. Variables already set win over the file.
    pub fn load_from(base_dir: &Path) -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT")
            .ok()
            .and_then(non_empty)
            .unwrap_or_else(|| Self::DEFAULT_ENVIRONMENT.to_string());

        let env_file = Self::env_file_path(base_dir, &environment);
        if load_env_file(&env_file)? {
            log::debug!("Loaded environment file {:?}", env_file);
        }

        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Location of the dotenv file for `environment`.
    pub fn env_file_path(base_dir: &Path, environment: &str) -> PathBuf {
        base_dir.join("env").join(environment).join(".env")
    }

    /// Build settings from an arbitrary variable source.
    ///
    /// `DEBUG` is only on for the exact value `True`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .and_then(non_empty)
            .unwrap_or_else(|| Self::DEFAULT_ENVIRONMENT.to_string());
        let debug = lookup("DEBUG").as_deref() == Some("True");

        Self {
            environment,
            debug,
            aws: AwsConfig::from_lookup(&lookup),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Load a dotenv file into the process environment.
///
/// Returns `Ok(false)` when the file does not exist.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.is_file() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|source| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

//! Configuration loading via `ortho-config`.
//!
//! [`ProbeConfig`] merges defaults, configuration files, and environment
//! variables. The binary applies its own CLI overrides on top before
//! projecting the record into the [`SessionConfig`] consumed by the verifier.

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::transport::SessionConfig;

/// Default SSH port used when none is configured.
pub const DEFAULT_PORT: u16 = 22;

/// Default dummy payload size (1 MiB).
pub const DEFAULT_FILE_SIZE: u64 = 1_048_576;

/// Probe settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SFTP_PROBE",
    discovery(
        app_name = "sftp-probe",
        env_var = "SFTP_PROBE_CONFIG_PATH",
        config_file_name = "sftp-probe.toml",
        dotfile_name = ".sftp-probe.toml",
        project_file_name = "sftp-probe.toml"
    )
)]
pub struct ProbeConfig {
    /// Hostname or IP address of the SFTP endpoint.
    #[ortho_config(default = String::new())]
    pub host: String,
    /// TCP port of the SSH server.
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: u16,
    /// Account used for password authentication.
    #[ortho_config(default = String::new())]
    pub username: String,
    /// Password for [`ProbeConfig::username`].
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Requested payload size in bytes. The uploaded file is one byte longer.
    #[ortho_config(default = DEFAULT_FILE_SIZE)]
    pub file_size: u64,
    /// Remote directory that receives the probe file. When unset the file
    /// lands in the login directory of the account.
    pub remote_dir: Option<String>,
    /// Whether to remove the probe file from the server after downloading it.
    /// Defaults to leaving the artefact in place.
    #[ortho_config(default = false)]
    pub delete_remote_file: bool,
    /// Socket and session timeout in seconds. Unset means block indefinitely.
    pub timeout_secs: Option<u64>,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ProbeConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to sftp-probe.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("sftp-probe")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty,
    /// and [`ConfigError::Invalid`] when the remote directory is blank or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.host,
            &FieldMetadata::new("SFTP host", "SFTP_PROBE_HOST", "host"),
        )?;
        Self::require_field(
            &self.username,
            &FieldMetadata::new("SFTP username", "SFTP_PROBE_USERNAME", "username"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::new("SFTP password", "SFTP_PROBE_PASSWORD", "password"),
        )?;
        if self
            .remote_dir
            .as_deref()
            .is_some_and(|dir| dir.trim().is_empty())
        {
            return Err(ConfigError::Invalid(String::from(
                "remote_dir must not be blank when set",
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(String::from(
                "timeout_secs must be greater than zero when set",
            )));
        }
        Ok(())
    }

    /// Builds the connection parameters consumed by a transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        self.validate()?;
        Ok(SessionConfig {
            host: self.host.trim().to_owned(),
            port: self.port,
            username: self.username.trim().to_owned(),
            password: self.password.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Returns the configured remote directory, trimmed.
    #[must_use]
    pub fn remote_directory(&self) -> Option<Utf8PathBuf> {
        self.remote_dir
            .as_deref()
            .map(|dir| Utf8PathBuf::from(dir.trim()))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a present field holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

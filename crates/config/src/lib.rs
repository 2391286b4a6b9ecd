#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for pkgsig
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pkgsig/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;

use pkgsig_errors::{ConfigError, Error};
use pkgsig_types::{OutputFormat, VerifyFlags};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub verify: VerifyConfig,

    #[serde(default)]
    pub keys: KeysConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Which checks package verification skips
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct VerifyConfig {
    #[serde(default)]
    pub nodigest: bool,
    #[serde(default)]
    pub nosignature: bool,
    /// Skip everything covering the payload
    #[serde(default)]
    pub nopayload: bool,
}

/// Keyring and key import configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeysConfig {
    pub keyring_dir: Option<PathBuf>,
    /// URL prefix or `{keyid}` template used to resolve `0x<keyid>` sources
    pub keyserver_query: Option<String>,
    #[serde(default = "default_min_source_bytes")]
    pub min_source_bytes: usize,
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbose: bool,
    /// Dump parsed OpenPGP packets at debug level
    #[serde(default)]
    pub print_packets: bool,
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            keyring_dir: None,
            keyserver_query: None,
            min_source_bytes: constants::MIN_SOURCE_BYTES,
            timeout: 30,
        }
    }
}

// Default value functions for serde
fn default_min_source_bytes() -> usize {
    constants::MIN_SOURCE_BYTES
}

fn default_timeout() -> u64 {
    30
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub fn load() -> Result<Self, Error> {
        match Self::default_path() {
            Ok(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load(),
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // PKGSIG_KEYRING
        if let Ok(dir) = std::env::var("PKGSIG_KEYRING") {
            self.keys.keyring_dir = Some(PathBuf::from(dir));
        }

        // PKGSIG_KEYSERVER
        if let Ok(query) = std::env::var("PKGSIG_KEYSERVER") {
            self.keys.keyserver_query = (!query.is_empty()).then_some(query);
        }

        // PKGSIG_VERBOSE
        if let Ok(verbose) = std::env::var("PKGSIG_VERBOSE") {
            self.output.verbose = parse_bool("PKGSIG_VERBOSE", verbose)?;
        }

        // PKGSIG_NODIGEST
        if let Ok(value) = std::env::var("PKGSIG_NODIGEST") {
            self.verify.nodigest = parse_bool("PKGSIG_NODIGEST", value)?;
        }

        // PKGSIG_NOSIGNATURE
        if let Ok(value) = std::env::var("PKGSIG_NOSIGNATURE") {
            self.verify.nosignature = parse_bool("PKGSIG_NOSIGNATURE", value)?;
        }

        // PKGSIG_OUTPUT
        if let Ok(output) = std::env::var("PKGSIG_OUTPUT") {
            self.output.format = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "PKGSIG_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        Ok(())
    }

    /// Flags selecting the checks to skip
    #[must_use]
    pub fn verify_flags(&self) -> VerifyFlags {
        VerifyFlags::from_switches(
            self.verify.nodigest,
            self.verify.nosignature,
            self.verify.nopayload,
        )
    }

    /// Get the keyring directory (with default)
    #[must_use]
    pub fn keyring_dir(&self) -> PathBuf {
        self.keys.keyring_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(
                || PathBuf::from(constants::FALLBACK_KEYS_DIR),
                |dir| dir.join(constants::APP_DIR).join("keys"),
            )
        })
    }
}

//! Lock configuration
//!
//! The configuration is read once when a lock is built and never changes
//! for the lifetime of that lock. It can be loaded from a TOML file; every
//! field is optional in the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::text;

/// Default number of digits in a passcode
pub const DEFAULT_PASSCODE_LENGTH: usize = 4;

/// Longest accepted passcode
pub const MAX_PASSCODE_LENGTH: usize = 64;

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory under ~/.config
const CONFIG_DIR_NAME: &str = "pinlock";

/// Static lock policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Number of digits that completes an entry
    #[serde(default = "default_passcode_length")]
    pub passcode_length: usize,

    /// Whether biometric authentication may be offered at all
    #[serde(default)]
    pub biometrics_allowed: bool,

    /// Whether to prompt for biometrics as soon as the lock is presented
    #[serde(default)]
    pub request_biometrics_immediately: bool,

    /// Reason shown in the platform biometric prompt
    #[serde(default)]
    pub biometric_reason: Option<String>,
}

fn default_passcode_length() -> usize {
    DEFAULT_PASSCODE_LENGTH
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            passcode_length: DEFAULT_PASSCODE_LENGTH,
            biometrics_allowed: false,
            request_biometrics_immediately: false,
            biometric_reason: None,
        }
    }
}

impl LockConfig {
    /// Create a config with the given passcode length and defaults elsewhere
    pub fn with_passcode_length(passcode_length: usize) -> Self {
        Self {
            passcode_length,
            ..Default::default()
        }
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        // Try XDG_CONFIG_HOME first, then fall back to ~/.config
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME));
        }

        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
    }

    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Self::config_dir()
            .map(|d| d.join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded lock config from {:?}", path);
        Ok(config)
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Check the policy invariants
    ///
    /// The passcode length must be in `1..=MAX_PASSCODE_LENGTH`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_PASSCODE_LENGTH).contains(&self.passcode_length) {
            return Err(ConfigError::InvalidPasscodeLength(self.passcode_length));
        }
        Ok(())
    }

    /// Prompt text for the biometric dialog
    pub fn biometric_reason(&self) -> &str {
        self.biometric_reason
            .as_deref()
            .unwrap_or(text::BIOMETRIC_REASON)
    }
}

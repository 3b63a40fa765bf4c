//! Configuration file support for oroadm-verify
//!
//! Loads and validates the verifier configuration from a TOML file.
//! Default location: /etc/oroadm/verify.toml

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use oroadm_types::{DeviceCategory, SchemaVersion, SignalRate};

use crate::error::ConfigError;
use crate::lifecycle::LifecycleParams;
use crate::naming::Spectrum;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/oroadm/verify.toml";

/// Environment variable overriding the device schema version.
pub const VERSION_ENV: &str = "OROADM_DEVICE_VERSION";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Controller connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// RESTCONF base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Device identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Node id as mounted on the controller
    #[serde(default)]
    pub node_id: Option<String>,

    /// OpenROADM model version tag (e.g. "2.2.1")
    #[serde(default)]
    pub version: Option<String>,

    /// Device category ("xponder" or "roadm"); taken from node info when unset
    #[serde(default)]
    pub category: Option<String>,
}

/// Lifecycle run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Prefix of renderer service names
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Pause after create/delete calls in milliseconds
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_min_slot")]
    pub spectrum_min_slot: u32,

    #[serde(default = "default_max_slot")]
    pub spectrum_max_slot: u32,

    /// Rates to exercise; empty derives them from port capabilities
    #[serde(default)]
    pub rates: Vec<SignalRate>,
}

/// Complete verifier configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

// Default functions
fn default_base_url() -> String {
    "http://127.0.0.1:8181".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_service_name() -> String {
    "oroadm-lifecycle".to_string()
}

fn default_settle_delay() -> u64 {
    2000
}

fn default_min_slot() -> u32 {
    761
}

fn default_max_slot() -> u32 {
    768
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: default_username(),
            password: default_password(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            settle_delay_ms: default_settle_delay(),
            spectrum_min_slot: default_min_slot(),
            spectrum_max_slot: default_max_slot(),
            rates: Vec::new(),
        }
    }
}

impl VerifyConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Applies the `OROADM_DEVICE_VERSION` override, if set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_version_override(std::env::var(VERSION_ENV).ok());
    }

    pub fn apply_version_override(&mut self, version: Option<String>) {
        if let Some(version) = version.filter(|v| !v.trim().is_empty()) {
            info!("Device version overridden to {}", version);
            self.device.version = Some(version);
        }
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.controller.timeout_secs)
    }

    /// Get settle delay as Duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.lifecycle.settle_delay_ms)
    }

    pub fn spectrum(&self) -> Spectrum {
        Spectrum::new(self.lifecycle.spectrum_min_slot, self.lifecycle.spectrum_max_slot)
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.device.version.as_deref().map(SchemaVersion::new)
    }

    pub fn device_category(&self) -> ConfigResult<Option<DeviceCategory>> {
        self.device
            .category
            .as_deref()
            .map(|c| {
                c.parse::<DeviceCategory>()
                    .map_err(|e| ConfigError::invalid("device.category", e.to_string()))
            })
            .transpose()
    }

    /// Lifecycle parameters for a node.
    pub fn lifecycle_params(&self, node_id: impl Into<String>) -> LifecycleParams {
        LifecycleParams::new(node_id)
            .with_service_name(self.lifecycle.service_name.clone())
            .with_spectrum(self.spectrum())
            .with_rates(self.lifecycle.rates.iter().copied())
            .with_settle_delay(self.settle_delay())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let url = &self.controller.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "controller.base_url",
                format!("'{}' is not an http(s) URL", url),
            ));
        }

        if self.controller.timeout_secs == 0 {
            return Err(ConfigError::invalid("controller.timeout_secs", "must be > 0"));
        }

        if !self.spectrum().is_valid() {
            return Err(ConfigError::invalid(
                "lifecycle.spectrum",
                format!("invalid slot range {}", self.spectrum()),
            ));
        }

        if self.lifecycle.service_name.trim().is_empty() {
            return Err(ConfigError::invalid("lifecycle.service_name", "must not be empty"));
        }

        self.device_category()?;
        Ok(())
    }
}

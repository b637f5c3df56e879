//! Configuration loading and typed config structures for opcsim.
//!
//! The configuration lives in `opcsim-config.yaml` in the working
//! directory. Every section and field has a default, so an empty or
//! missing file yields the stock simulator on port 4334.

use std::path::Path;

use chrono::NaiveDate;
use opcsim_types::SecurityPolicy;
use serde::Deserialize;

use crate::binder::DEFAULT_SAMPLING_INTERVAL_MS;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 4334;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is unusable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulatorConfig {
    /// Listening endpoint and advertised security.
    #[serde(default)]
    pub server: ServerSection,

    /// Device tree parameters.
    #[serde(default)]
    pub address_space: AddressSpaceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulatorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the server section:
    /// - `OPCSIM_HOST` overrides `server.host`
    /// - `OPCSIM_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides and validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.server.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                reason: "server.port must be non-zero".to_owned(),
            });
        }
        if self.server.security_policies.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "server.security_policies must list at least one policy".to_owned(),
            });
        }
        if !self.address_space.temperature_base.is_finite() {
            return Err(ConfigError::Invalid {
                reason: "address_space.temperature_base must be finite".to_owned(),
            });
        }
        Ok(())
    }
}

/// Listening endpoint and advertised security configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether anonymous clients are advertised as accepted.
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,

    /// Security policies advertised on the endpoint.
    #[serde(default = "default_security_policies")]
    pub security_policies: Vec<SecurityPolicy>,

    /// Product identification reported to clients.
    #[serde(default)]
    pub build_info: BuildInfo,
}

impl ServerSection {
    /// Apply `OPCSIM_HOST` / `OPCSIM_PORT` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `OPCSIM_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("OPCSIM_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("OPCSIM_PORT") {
            self.port = port.parse().map_err(|_err| ConfigError::Invalid {
                reason: format!("OPCSIM_PORT is not a valid port: {port}"),
            })?;
        }
        Ok(())
    }

    /// The advertised endpoint URL, `opc.tcp://host:port`.
    pub fn endpoint_url(&self) -> String {
        format!("opc.tcp://{}:{}", self.host, self.port)
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allow_anonymous: true,
            security_policies: default_security_policies(),
            build_info: BuildInfo::default(),
        }
    }
}

/// Product identification reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildInfo {
    /// Product name.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Build number.
    #[serde(default = "default_build_number")]
    pub build_number: String,

    /// Build date.
    #[serde(default = "default_build_date")]
    pub build_date: NaiveDate,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            build_number: default_build_number(),
            build_date: default_build_date(),
        }
    }
}

/// Device tree parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddressSpaceConfig {
    /// Centre of the temperature oscillation.
    #[serde(default = "default_temperature_base")]
    pub temperature_base: f64,

    /// Sampling interval hint for device and simulator variables.
    #[serde(default = "default_sampling_interval_ms")]
    pub sampling_interval_ms: u32,

    /// Sampling interval hint for the memory usage variable.
    #[serde(default = "default_memory_sampling_interval_ms")]
    pub memory_sampling_interval_ms: u32,

    /// Fixed text held by `MyVariable2`.
    #[serde(default = "default_banner")]
    pub banner: String,
}

impl Default for AddressSpaceConfig {
    fn default() -> Self {
        Self {
            temperature_base: default_temperature_base(),
            sampling_interval_ms: default_sampling_interval_ms(),
            memory_sampling_interval_ms: default_memory_sampling_interval_ms(),
            banner: default_banner(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_true() -> bool {
    true
}

fn default_security_policies() -> Vec<SecurityPolicy> {
    vec![SecurityPolicy::None, SecurityPolicy::Basic256Sha256]
}

fn default_product_name() -> String {
    "Sample NodeOPCUA Server1".to_owned()
}

fn default_build_number() -> String {
    "7658".to_owned()
}

fn default_build_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 26).unwrap_or_default()
}

const fn default_temperature_base() -> f64 {
    10.0
}

const fn default_sampling_interval_ms() -> u32 {
    DEFAULT_SAMPLING_INTERVAL_MS
}

const fn default_memory_sampling_interval_ms() -> u32 {
    1000
}

fn default_banner() -> String {
    "Learn Node-OPCUA ! Read https://leanpub.com/node-opcuabyexample-edition2024".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimulatorConfig::parse("").unwrap();
        assert_eq!(config.address_space, AddressSpaceConfig::default());
        assert!(config.server.allow_anonymous);
        assert_eq!(
            config.server.security_policies,
            vec![SecurityPolicy::None, SecurityPolicy::Basic256Sha256]
        );
        assert_eq!(config.server.build_info.build_number, "7658");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "\
address_space:
  temperature_base: 25.0
server:
  allow_anonymous: false
  security_policies: [Basic256Sha256]
  build_info:
    build_date: 2025-01-31
";
        let config = SimulatorConfig::parse(yaml).unwrap();
        assert!((config.address_space.temperature_base - 25.0).abs() < f64::EPSILON);
        assert_eq!(config.address_space.sampling_interval_ms, 500);
        assert!(!config.server.allow_anonymous);
        assert_eq!(config.server.security_policies, vec![SecurityPolicy::Basic256Sha256]);
        assert_eq!(
            config.server.build_info.build_date,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(config.server.build_info.product_name, "Sample NodeOPCUA Server1");
    }

    #[test]
    fn empty_policy_list_is_invalid() {
        let err = SimulatorConfig::parse("server:\n  security_policies: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_port_is_invalid() {
        let mut config = SimulatorConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_policy_is_a_yaml_error() {
        let err = SimulatorConfig::parse("server:\n  security_policies: [Aes128]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn endpoint_url_uses_host_and_port() {
        let server = ServerSection {
            host: "localhost".to_owned(),
            ..ServerSection::default()
        };
        assert_eq!(server.endpoint_url(), "opc.tcp://localhost:4334");
    }
}

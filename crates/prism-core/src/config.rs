// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime configuration: which backend to load and how.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`RuntimeConfig::backend`].
pub const ENV_BACKEND: &str = "PRISM_BACKEND";
/// Environment variable overriding [`RuntimeConfig::debug`].
pub const ENV_DEBUG: &str = "PRISM_DEBUG";
/// Environment variable overriding [`RuntimeConfig::device_index`].
pub const ENV_DEVICE: &str = "PRISM_DEVICE";

/// Errors raised while loading a [`RuntimeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid JSON for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// An environment override holds an unusable value.
    #[error("environment variable {var} has invalid value '{value}'")]
    InvalidEnv {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Selects and configures the backend a runtime loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Backend name, e.g. `software`.
    pub backend: String,
    /// Enables the backend's debug layer before any device is used.
    pub debug: bool,
    /// Pins device selection to this discovery index.
    pub device_index: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: "software".to_string(),
            debug: false,
            device_index: None,
        }
    }
}

impl RuntimeConfig {
    /// Parses a configuration from JSON text. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// The default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Applies `PRISM_BACKEND`, `PRISM_DEBUG` and `PRISM_DEVICE` on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(backend) = lookup(ENV_BACKEND) {
            let backend = backend.trim();
            if backend.is_empty() {
                return Err(ConfigError::InvalidEnv {
                    var: ENV_BACKEND,
                    value: backend.to_string(),
                });
            }
            self.backend = backend.to_ascii_lowercase();
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            self.debug = parse_flag(&debug).ok_or(ConfigError::InvalidEnv {
                var: ENV_DEBUG,
                value: debug.clone(),
            })?;
        }
        if let Some(device) = lookup(ENV_DEVICE) {
            let index = device
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_DEVICE,
                    value: device.clone(),
                })?;
            self.device_index = Some(index);
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.backend, "software");
        assert!(!config.debug);
        assert_eq!(config.device_index, None);
    }

    #[test]
    fn json_fills_missing_fields() {
        let config = RuntimeConfig::from_json_str(r#"{ "debug": true }"#).unwrap();
        assert_eq!(config.backend, "software");
        assert!(config.debug);

        let config = RuntimeConfig::from_json_str(r#"{ "backend": "null", "device_index": 1 }"#)
            .unwrap();
        assert_eq!(config.backend, "null");
        assert_eq!(config.device_index, Some(1));

        assert!(matches!(
            RuntimeConfig::from_json_str("{ backend }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_overrides() {
        let config = RuntimeConfig::default()
            .with_overrides(env(&[
                (ENV_BACKEND, "NULL"),
                (ENV_DEBUG, "yes"),
                (ENV_DEVICE, " 2 "),
            ]))
            .unwrap();
        assert_eq!(
            config,
            RuntimeConfig {
                backend: "null".to_string(),
                debug: true,
                device_index: Some(2),
            }
        );
    }

    #[test]
    fn invalid_environment_values() {
        let err = RuntimeConfig::default()
            .with_overrides(env(&[(ENV_DEBUG, "maybe")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "environment variable PRISM_DEBUG has invalid value 'maybe'"
        );
        assert!(RuntimeConfig::default()
            .with_overrides(env(&[(ENV_DEVICE, "-1")]))
            .is_err());
        assert!(RuntimeConfig::default()
            .with_overrides(env(&[(ENV_BACKEND, "  ")]))
            .is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            RuntimeConfig::load("/nonexistent/prism.json"),
            Err(ConfigError::Io(_))
        ));
    }
}

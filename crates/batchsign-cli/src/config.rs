/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Configuration file discovery and parsing.
//!
//! ```toml
//! [credentials]
//! certificate_name = "release-signing"
//! key_vault_url = "https://contoso.vault.example.net/"
//! timestamp_url = "http://timestamp.example.net/"
//! access_token = "${BATCHSIGN_TOKEN:?set it from the CI secret store}"
//!
//! [signer]
//! tool_name = "vsix-signer"
//! sign_command = { program = "vsix-sign", args = ["sign", "--fd", "{file_digest}", "{file}"] }
//! timestamp_command = { program = "vsix-sign", args = ["timestamp", "-t", "{timestamp_url}", "{file}"] }
//! ```

use batchsign::CommandTemplate;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "BATCHSIGN_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration file found")]
    ConfigNotFound,

    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported configuration format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("{0}")]
    EnvSubstitutionError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchsignConfig {
    pub credentials: CredentialsConfig,
    pub signer: SignerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub certificate_name: String,
    pub key_vault_url: Url,
    #[serde(default)]
    pub timestamp_url: Option<Url>,
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub tool_name: Option<String>,
    pub sign_command: CommandTemplate,
    #[serde(default)]
    pub timestamp_command: Option<CommandTemplate>,
}

impl BatchsignConfig {
    /// Checks cross-field constraints serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.timestamp_url.is_some() && self.signer.timestamp_command.is_none() {
            return Err(ConfigError::Invalid(
                "credentials.timestamp_url is set but signer.timestamp_command is missing".into(),
            ));
        }
        if self.signer.sign_command.program.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "signer.sign_command.program is empty".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("./batchsign.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("batchsign").join("config.toml"));
        }

        search_paths.push(PathBuf::from("/etc/batchsign/config.toml"));

        Self { search_paths }
    }

    /// Create a config loader with custom search paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Resolve which file would be loaded: explicit path, then
    /// `BATCHSIGN_CONFIG`, then the first existing search path.
    pub fn resolve_path(&self, config_file: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_file {
            Some(path.to_path_buf())
        } else if let Ok(env_config) = env::var(CONFIG_ENV) {
            Some(PathBuf::from(env_config))
        } else {
            self.find_config_file()
        }
    }

    /// Load configuration from the specified file or auto-discover
    pub fn load_config(&self, config_file: Option<&Path>) -> Result<BatchsignConfig, ConfigError> {
        let config_path = self
            .resolve_path(config_file)
            .ok_or(ConfigError::ConfigNotFound)?;
        self.load_config_from_file(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_config_from_file(&self, path: &Path) -> Result<BatchsignConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let substituted = self.substitute_env_vars(&content)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") | None => toml::from_str::<BatchsignConfig>(&substituted)?,
            Some(ext) => {
                return Err(ConfigError::UnsupportedFormat {
                    extension: ext.to_string(),
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Find the first existing configuration file in search paths
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .find(|path| path.is_file())
            .cloned()
    }

    /// Substitute `${VAR}`, `${VAR:-default}` and `${VAR:?message}`.
    fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::EnvSubstitutionError(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let replacement = self.process_var_expression(&cap[1])?;
            result = result.replace(&cap[0], &replacement);
        }

        Ok(result)
    }

    fn process_var_expression(&self, expr: &str) -> Result<String, ConfigError> {
        if let Some((var_name, default_value)) = expr.split_once(":-") {
            Ok(env::var(var_name).unwrap_or_else(|_| default_value.to_string()))
        } else if let Some((var_name, error_msg)) = expr.split_once(":?") {
            env::var(var_name).map_err(|_| {
                ConfigError::EnvSubstitutionError(format!(
                    "Required environment variable '{}' is not set: {}",
                    var_name, error_msg
                ))
            })
        } else {
            env::var(expr).map_err(|_| {
                ConfigError::EnvSubstitutionError(format!(
                    "Required environment variable '{}' is not set",
                    expr
                ))
            })
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

//! Configuration loading for the Jurnal source.
//!
//! Runtime settings come from layered `.env` files and environment variables
//! prefixed with `JURNAL_`, producing a typed [`AppConfig`]. The connector's
//! own parameters (the API key) arrive separately as a JSON document and are
//! parsed into [`ConnectorConfig`].

use std::{collections::BTreeMap, env, fmt, fs, path::Path, path::PathBuf};

use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

const ENV_PREFIX: &str = "JURNAL_";

/// Runtime settings derived from `JURNAL_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            api_base: default_api_base(),
        }
    }
}

impl AppConfig {
    /// Returns the API base as a URL that resource paths can be joined onto.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        let mut base = self.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = Url::parse(&base).map_err(|source| ConfigError::InvalidApiBase {
            value: self.api_base.clone(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::UnsupportedApiBaseScheme {
                scheme: scheme.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        self.api_base_url()?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_api_base() -> String {
    "https://api.jurnal.id/core/api/v1/".to_string()
}

/// Jurnal API key. Redacted in debug output and wiped from memory on drop.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Parameters supplied by whoever launches a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    pub apikey: ApiKey,
}

impl ConnectorConfig {
    pub fn new(apikey: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            apikey: ApiKey::new(apikey),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a connector config JSON document.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConfigError> {
        if value.get("apikey").is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        let config: Self = serde_json::from_value(value)
            .map_err(|source| ConfigError::InvalidConnectorConfig { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a connector config JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let value = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::InvalidConnectorConfig { source })?;
        Self::from_json(value)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.apikey.expose();
        if key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if HeaderValue::from_str(key).is_err() {
            return Err(ConfigError::InvalidApiKey);
        }
        Ok(())
    }
}

/// JSON schema of [`ConnectorConfig`], advertised by the `spec` command.
pub fn connection_specification() -> serde_json::Value {
    serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Jurnal Spec",
        "type": "object",
        "required": ["apikey"],
        "additionalProperties": true,
        "properties": {
            "apikey": {
                "type": "string",
                "title": "API Key",
                "description": "Jurnal API key sent in the apikey header of every request.",
                "airbyte_secret": true
            }
        }
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid connector config: {source}")]
    InvalidConnectorConfig { source: serde_json::Error },
    #[error("api key is missing; set \"apikey\" in the connector config")]
    MissingApiKey,
    #[error("api key contains characters that cannot be sent in an HTTP header")]
    InvalidApiKey,
    #[error("invalid api base '{value}': {source}")]
    InvalidApiBase {
        value: String,
        source: url::ParseError,
    },
    #[error("api base must use http or https, got '{scheme}'")]
    UnsupportedApiBaseScheme { scheme: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let api_base = layered
            .remove("API_BASE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(default_api_base);

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            api_base,
        };

        config.validate()?;

        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("JURNAL_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_base_url_appends_trailing_slash() {
        let config = AppConfig {
            api_base: "http://127.0.0.1:9000/core/api/v1".to_string(),
            ..AppConfig::default()
        };

        let url = config.api_base_url().unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/core/api/v1/");
        assert_eq!(
            url.join("companies/active").unwrap().as_str(),
            "http://127.0.0.1:9000/core/api/v1/companies/active"
        );
    }

    #[test]
    fn test_default_api_base() {
        let url = AppConfig::default().api_base_url().unwrap();
        assert_eq!(
            url.join("accounts").unwrap().as_str(),
            "https://api.jurnal.id/core/api/v1/accounts"
        );
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let config = AppConfig {
            log_format: "xml".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLogFormat { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_http_api_base() {
        let config = AppConfig {
            api_base: "ftp://api.jurnal.id/core/api/v1/".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedApiBaseScheme { scheme }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_connector_config_from_json() {
        let config = ConnectorConfig::from_json(json!({"apikey": "secret-key"})).unwrap();
        assert_eq!(config.apikey.expose(), "secret-key");
    }

    #[test]
    fn test_connector_config_missing_apikey() {
        let err = ConnectorConfig::from_json(json!({"api_key": "wrong-name"})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_connector_config_blank_apikey() {
        let err = ConnectorConfig::from_json(json!({"apikey": "   "})).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_connector_config_non_string_apikey() {
        let err = ConnectorConfig::from_json(json!({"apikey": 42})).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConnectorConfig { .. }));
    }

    #[test]
    fn test_connector_config_rejects_header_breaking_key() {
        let err = ConnectorConfig::new("abc\r\ndef").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApiKey));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let config = ConnectorConfig::new("super-secret").unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_connection_specification_requires_apikey() {
        let spec = connection_specification();
        assert_eq!(spec["required"], json!(["apikey"]));
        assert_eq!(spec["properties"]["apikey"]["airbyte_secret"], json!(true));
    }
}

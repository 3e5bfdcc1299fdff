//! Application Settings
//!
//! Layered as: the bundled `config/default.toml`, then an optional local file
//! (path from `INCIDENT_CONFIG`, default `config/local`), then `INCIDENT__*`
//! environment variables, e.g. `INCIDENT__SERVER__PORT=9000`. List values
//! such as `INCIDENT__CORS__ALLOWED_ORIGINS` are comma separated.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");
const DEFAULT_LOCAL_CONFIG: &str = "config/local";

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsSettings,
    pub metrics: MetricsSettings,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Socket address string for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Model artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
}

/// Log output
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Settings {
    /// Load settings from defaults, local file and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(None)
    }

    /// Load with `vars` standing in for the process environment when given
    fn from_env(vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let local = match &vars {
            Some(vars) => vars.get("INCIDENT_CONFIG").cloned(),
            None => std::env::var("INCIDENT_CONFIG").ok(),
        }
        .unwrap_or_else(|| DEFAULT_LOCAL_CONFIG.to_string());

        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name(&local).required(false))
            .add_source(
                Environment::with_prefix("INCIDENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .source(vars),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults with a TOML overlay applied
    pub fn with_overrides(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            model: ModelSettings {
                model_path: PathBuf::from("models/incident_clf.json"),
                meta_path: PathBuf::from("models/model_meta.json"),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json: false,
            },
            rate_limit: RateLimitConfig::default(),
            cors: CorsSettings {
                allowed_origins: vec!["http://localhost:5173".to_string()],
            },
            metrics: MetricsSettings { enabled: true },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let settings = Settings::with_overrides("").unwrap();
        let defaults = Settings::default();

        assert_eq!(settings.server.port, defaults.server.port);
        assert_eq!(settings.model.model_path, defaults.model.model_path);
        assert_eq!(settings.model.meta_path, defaults.model.meta_path);
        assert_eq!(settings.cors.allowed_origins, defaults.cors.allowed_origins);
        assert!(!settings.rate_limit.enabled);
        assert!(settings.metrics.enabled);
    }

    #[test]
    fn test_overlay_overrides_single_keys() {
        let settings = Settings::with_overrides(
            r#"
            [server]
            port = 9100

            [model]
            model_path = "/srv/models/clf.onnx"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.addr(), "0.0.0.0:9100");
        assert_eq!(settings.model.model_path, PathBuf::from("/srv/models/clf.onnx"));
        assert_eq!(settings.model.meta_path, PathBuf::from("models/model_meta.json"));
    }

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_local_file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("local.toml");
        std::fs::write(
            &local,
            r#"
            [server]
            port = 9100

            [model]
            meta_path = "/srv/models/meta.json"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        let settings = Settings::from_env(Some(vars(&[
            ("INCIDENT_CONFIG", local.to_str().unwrap()),
            ("INCIDENT__MODEL__MODEL_PATH", "/srv/models/clf.onnx"),
            ("INCIDENT__LOGGING__LEVEL", "debug"),
            ("INCIDENT__RATE_LIMIT__ENABLED", "true"),
            (
                "INCIDENT__CORS__ALLOWED_ORIGINS",
                "https://ops.example.com,https://oncall.example.com",
            ),
            ("UNRELATED__SERVER__PORT", "1"),
        ])))
        .unwrap();

        // From the local file
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.model.meta_path, PathBuf::from("/srv/models/meta.json"));
        // Environment wins over the file
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.model.model_path, PathBuf::from("/srv/models/clf.onnx"));
        assert!(settings.rate_limit.enabled);
        assert_eq!(
            settings.cors.allowed_origins,
            vec!["https://ops.example.com", "https://oncall.example.com"]
        );
        // Bundled defaults fill the rest
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.rate_limit.burst_size, 5);
    }

    #[test]
    fn test_missing_local_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let settings =
            Settings::from_env(Some(vars(&[("INCIDENT_CONFIG", missing.to_str().unwrap())])))
                .unwrap();
        assert_eq!(settings.server.port, Settings::default().server.port);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_invalid_type_rejected() {
        assert!(Settings::with_overrides("[server]\nport = \"eighty\"").is_err());
    }
}

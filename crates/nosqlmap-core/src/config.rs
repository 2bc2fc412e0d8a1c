//! Adapter configuration loaded from TOML.
//!
//! Every section is optional; a missing file section falls back to defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub logging: LoggingConfig,
    pub document: DocumentConfig,
}

impl MappingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            delivery = ?config.document.delivery,
            "loaded config"
        );
        Ok(config)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,nosqlmap=debug".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Where an async driver fires its completion callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// On a freshly spawned runtime task.
    #[default]
    Spawned,
    /// On the calling thread, before the request returns.
    Inline,
}

/// `[document]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub delivery: DeliveryMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = MappingConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, MappingConfig::default());
        assert_eq!(config.document.delivery, DeliveryMode::Spawned);
        assert_eq!(config.logging.filter, "info,nosqlmap=debug");
    }

    #[test]
    fn sections_override_defaults() {
        let config = MappingConfig::from_toml_str(
            r#"
            [logging]
            format = "json"

            [document]
            delivery = "inline"
            "#,
        )
        .expect("config should parse");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info,nosqlmap=debug");
        assert_eq!(config.document.delivery, DeliveryMode::Inline);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MappingConfig::from_toml_str("[document]\nretries = 3\n")
            .expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MappingConfig::load("/nonexistent/nosqlmap.toml").expect_err("must fail");
        assert!(err.to_string().contains("/nonexistent/nosqlmap.toml"));
    }

    #[test]
    fn load_reads_file_and_logs_the_path() {
        let path = std::env::temp_dir().join(format!("nosqlmap-{}.toml", std::process::id()));
        std::fs::write(&path, "[document]\ndelivery = \"inline\"\n").expect("write config");

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let loaded = tracing::subscriber::with_default(subscriber, || MappingConfig::load(&path));
        std::fs::remove_file(&path).expect("remove config");

        let config = loaded.expect("config should load");
        assert_eq!(config.document.delivery, DeliveryMode::Inline);

        let output = String::from_utf8(captured.0.lock().expect("lock").clone()).expect("utf8");
        assert!(output.contains("loaded config"), "{output}");
        assert!(output.contains(&path.display().to_string()), "{output}");
    }
}

//! Engine configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file)
//! configures the stock engine:
//!
//! ```yaml
//! url:
//!   allowed_schemes: [http, https]
//! key_value_store:
//!   receiver: NSUbiquitousKeyValueStore.default
//!   read_method: object
//!   write_method: set
//!   key_label: forKey
//! symbols:
//!   catalog: symbols.txt   # relative to this file
//! logging:
//!   level: warn
//! ```

use crate::errors::SigilError;
use crate::macros::{KeyValueStore, MacroServices, SymbolSet, UrlPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub url: UrlPolicy,
    pub key_value_store: StoreConfig,
    pub symbols: SymbolsConfig,
    pub logging: LoggingSettings,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Dotted path of the store instance.
    pub receiver: String,
    pub read_method: String,
    pub write_method: String,
    pub key_label: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let store = KeyValueStore::default();
        Self {
            receiver: store.receiver_path(),
            read_method: store.read_method,
            write_method: store.write_method,
            key_label: store.key_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SymbolsConfig {
    /// Newline-delimited symbol names. Without one, symbol names are not checked.
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Filter directive for this crate's events.
    pub fn directive(self) -> String {
        format!("sigil={}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: LogLevel,
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SigilError> {
        // An empty document deserializes as unit, not as an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| SigilError::config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SigilError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SigilError::io(path.display().to_string(), e))?;
        let mut config = Self::from_yaml_str(&text).map_err(|e| match e {
            SigilError::Config { message, .. } => SigilError::Config {
                message: format!("{}: {}", path.display(), message),
                help: Some("every section and field is optional; see `sigil --help`".into()),
            },
            other => other,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Path of the symbol catalog, resolved against the config file location.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        let catalog = self.symbols.catalog.as_ref()?;
        Some(match &self.base_dir {
            Some(base) if catalog.is_relative() => base.join(catalog),
            _ => catalog.clone(),
        })
    }

    /// Validates the store description and loads the symbol catalog.
    pub fn services(&self) -> Result<MacroServices, SigilError> {
        let mut services = MacroServices {
            url_policy: self.url.clone(),
            store: self.key_value_store.to_store()?,
            symbols: None,
        };
        if let Some(path) = self.catalog_path() {
            services = services.with_symbols(Arc::new(SymbolSet::load(&path)?));
        }
        Ok(services)
    }
}

impl StoreConfig {
    fn to_store(&self) -> Result<KeyValueStore, SigilError> {
        let receiver: Vec<String> = self.receiver.split('.').map(str::to_string).collect();
        for segment in &receiver {
            require_identifier("key_value_store.receiver", segment, &self.receiver)?;
        }
        require_identifier("key_value_store.read_method", &self.read_method, &self.read_method)?;
        require_identifier("key_value_store.write_method", &self.write_method, &self.write_method)?;
        require_identifier("key_value_store.key_label", &self.key_label, &self.key_label)?;
        KeyValueStore::new(
            receiver,
            self.read_method.as_str(),
            self.write_method.as_str(),
            self.key_label.as_str(),
        )
        .ok_or_else(|| SigilError::config("key_value_store.receiver: the path is empty"))
    }
}

fn require_identifier(field: &str, segment: &str, whole: &str) -> Result<(), SigilError> {
    let mut chars = segment.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SigilError::config(format!(
            "{field}: '{whole}' is not a valid identifier path"
        )))
    }
}

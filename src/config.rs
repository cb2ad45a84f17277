//! # Configuration
//!
//! Settings that were product decisions in earlier versions of the page script
//! and are now explicit: how the per-page storage key is derived, whether the
//! playback speed is remembered, the font range and how the active row is
//! scrolled into view.
//!
//! Configuration is YAML. Every field has a default, so an empty document (or
//! a missing file) gives the default configuration.
//!
//! ## Example
//! ```rust
//! use hymnal::{Config, PageKeySource};
//!
//! let config = Config::from_yaml(r#"
//! storage:
//!   page_key: identifier
//!   persist_speed: true
//! font:
//!   default: 20
//! "#).unwrap();
//!
//! assert_eq!(config.storage.page_key, PageKeySource::Identifier);
//! assert!(config.storage.persist_speed);
//! assert_eq!(config.font.default, 20);
//! assert_eq!(config.font.max, 32);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::HymnalError;
use crate::playback::ScrollOptions;
use crate::prefs::{FontRange, PageKeySource};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub font: FontRange,
    pub scroll: ScrollOptions,
}

/// Preference storage section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the per-page key comes from (server identifier or URL path)
    pub page_key: PageKeySource,
    /// Remember the chosen playback speed per page
    pub persist_speed: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_key: PageKeySource::Path,
            persist_speed: false,
        }
    }
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, HymnalError> {
        let config: Config = if source.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(source)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// A missing file gives the default configuration. An unreadable or
    /// invalid file is an error.
    pub fn load(path: &Path) -> Result<Self, HymnalError> {
        if !path.exists() {
            log::info!("config {:?} not found, using defaults", path);
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HymnalError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), HymnalError> {
        let font = &self.font;
        if font.min > font.max {
            return Err(HymnalError::Config(format!(
                "font.min ({}) must not exceed font.max ({})",
                font.min, font.max
            )));
        }
        if font.min == 0 {
            return Err(HymnalError::Config("font.min must be positive".to_string()));
        }
        if font.default < font.min || font.default > font.max {
            return Err(HymnalError::Config(format!(
                "font.default ({}) must lie within [{}, {}]",
                font.default, font.min, font.max
            )));
        }
        Ok(())
    }
}

//! Run configuration: injected metadata and recognition patterns.
//!
//! Loaded from a TOML file and overridden by CLI flags. Nothing here reads
//! the clock; the binary supplies today's date when none is configured.

use crate::error::ConfigError;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_ERROR_CODE_PATTERN: &str = r"[A-Z]{3}-[0-9]{3}";
pub const DEFAULT_SCREEN_CODE_PATTERN: &str = r"[A-Z]{3}_[0-9]{2}";
pub const DEFAULT_VERSION: &str = "1.0";

static RE_DEFAULT_ERROR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_ERROR_CODE_PATTERN).unwrap());

static RE_DEFAULT_SCREEN_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_SCREEN_CODE_PATTERN).unwrap());

fn default_popup_keywords() -> Vec<String> {
    ["ポップアップ", "ダイアログ", "モーダル", "popup", "dialog", "modal"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub metadata: MetadataConfig,
    pub patterns: PatternConfig,
}

/// Metadata block values. Unset fields are derived from the document or left blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub screen_code: Option<String>,
    pub screen_name: Option<String>,
    pub description: Option<String>,
    pub created: Option<NaiveDate>,
    pub updated: Option<NaiveDate>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternConfig {
    pub error_code: String,
    pub screen_code: String,
    pub popup_keywords: Vec<String>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            error_code: DEFAULT_ERROR_CODE_PATTERN.to_string(),
            screen_code: DEFAULT_SCREEN_CODE_PATTERN.to_string(),
            popup_keywords: default_popup_keywords(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Fill unset dates with `today`. Called by the binary, never by the pipeline.
    pub fn with_default_dates(mut self, today: NaiveDate) -> Self {
        let created = self.metadata.created.unwrap_or(today);
        self.metadata.created = Some(created);
        if self.metadata.updated.is_none() {
            self.metadata.updated = Some(today);
        }
        self
    }

    pub fn version(&self) -> &str {
        self.metadata.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }
}

/// Compiled recognition patterns for a run.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub error_code: Regex,
    pub screen_code: Regex,
    /// Lowercased keywords marking popup/dialog items.
    pub popup_keywords: Vec<String>,
}

impl Default for Patterns {
    fn default() -> Self {
        Self {
            error_code: RE_DEFAULT_ERROR_CODE.clone(),
            screen_code: RE_DEFAULT_SCREEN_CODE.clone(),
            popup_keywords: lowercase_all(&default_popup_keywords()),
        }
    }
}

impl Patterns {
    pub fn compile(config: &PatternConfig) -> Result<Self, ConfigError> {
        let error_code = Regex::new(&config.error_code).map_err(|e| ConfigError::Pattern {
            name: "error_code",
            source: e,
        })?;
        let screen_code = Regex::new(&config.screen_code).map_err(|e| ConfigError::Pattern {
            name: "screen_code",
            source: e,
        })?;
        Ok(Self {
            error_code,
            screen_code,
            popup_keywords: lowercase_all(&config.popup_keywords),
        })
    }
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

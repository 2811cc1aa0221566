//! Site configuration (_config.yml)

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::BuildError;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    /// IANA timezone used for dates without an offset
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,
    pub pretty_urls: bool,

    // Layouts
    pub default_layout: String,
    pub layouts_dir: String,

    // Content
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub search_index: SearchIndexConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "mdpress".to_string(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),
            timezone: "UTC".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),
            pretty_urls: true,

            default_layout: "default".to_string(),
            layouts_dir: "_layouts".to_string(),

            exclude: Vec::new(),

            highlight: HighlightConfig::default(),
            feed: FeedConfig::default(),
            search_index: SearchIndexConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Self::parse(&content).map_err(|e| BuildError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse configuration from YAML text. An empty file yields the defaults.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Resolve the configured timezone, falling back to UTC
    pub fn tz(&self) -> Tz {
        match self.timezone.trim() {
            "" => Tz::UTC,
            name => name.parse().unwrap_or_else(|_| {
                tracing::warn!("Unknown timezone {:?}, using UTC", name);
                Tz::UTC
            }),
        }
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Atom feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub enable: bool,
    pub path: String,
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enable: true,
            path: "atom.xml".to_string(),
            limit: 20,
        }
    }
}

/// Search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchIndexConfig {
    pub enable: bool,
    pub path: String,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self {
            enable: false,
            path: "search.json".to_string(),
        }
    }
}

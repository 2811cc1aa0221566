//! mdpress: a static publishing pipeline for Markdown documents
//!
//! Walks a directory of Markdown files with YAML front matter, renders each
//! one through a Tera layout and writes a static site. Problems with single
//! documents are collected in a build report; only site-level failures abort
//! the build.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod renderer;
pub mod server;
pub mod templates;

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::content::ContentFilter;
use crate::error::BuildError;
use crate::generator::{BuildOptions, BuildReport, Generator};

/// Name of the site configuration file in the content root
pub const CONFIG_FILE: &str = "_config.yml";

/// A site: configuration plus its input and output directories
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: SiteConfig,
    /// Configuration file, if one was loaded
    pub config_path: Option<PathBuf>,
    /// Content root
    pub input_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Site {
    /// Open a site rooted at `input_dir`.
    ///
    /// `config_path` defaults to `<input>/_config.yml`; a missing default
    /// config is not an error, a missing explicit one is.
    pub fn open<P: AsRef<Path>>(
        input_dir: P,
        output_dir: Option<PathBuf>,
        config_path: Option<PathBuf>,
    ) -> Result<Self, BuildError> {
        let input_dir = input_dir.as_ref().to_path_buf();
        let output_dir = output_dir.unwrap_or_else(|| input_dir.join("public"));

        let config_path = config_path.or_else(|| {
            let default = input_dir.join(CONFIG_FILE);
            default.is_file().then_some(default)
        });
        let config = match &config_path {
            Some(path) => SiteConfig::load(path)?,
            None => SiteConfig::default(),
        };

        Ok(Self {
            config,
            config_path,
            input_dir,
            output_dir,
        })
    }

    /// Site with an already loaded configuration
    pub fn with_config(config: SiteConfig, input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            config,
            config_path: None,
            input_dir,
            output_dir,
        }
    }

    /// Re-read the configuration file
    pub fn reload(&self) -> Result<Self, BuildError> {
        Self::open(
            &self.input_dir,
            Some(self.output_dir.clone()),
            self.config_path.clone(),
        )
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.input_dir.join(&self.config.layouts_dir)
    }

    /// Which paths under the input directory are content. An output
    /// directory nested in the input is never treated as content.
    pub fn content_filter(&self) -> Result<ContentFilter, BuildError> {
        let filter = ContentFilter::new(&self.config.exclude).map_err(|e| BuildError::Config {
            path: self
                .config_path
                .clone()
                .unwrap_or_else(|| self.input_dir.join(CONFIG_FILE)),
            reason: format!("invalid exclude pattern: {}", e),
        })?;

        Ok(match self.output_dir.strip_prefix(&self.input_dir) {
            Ok(relative) if !relative.as_os_str().is_empty() => filter.skip_dir(relative),
            _ => filter,
        })
    }

    /// Build the site
    pub fn build(&self, options: BuildOptions) -> Result<BuildReport, BuildError> {
        Generator::new(self)?.build(options)
    }
}

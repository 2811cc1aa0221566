//! Rendered page model

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

use crate::content::Slug;

/// A document after Markdown conversion and layout application
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub slug: Slug,
    /// Final HTML, layout applied
    pub html_body: String,
    /// Markdown body as HTML, before the layout
    pub content: String,
    /// Layout that produced `html_body`
    pub layout: String,

    /// Source file path
    pub source: PathBuf,
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub modified: Option<DateTime<FixedOffset>>,
    /// Plain-text excerpt
    pub excerpt: Option<String>,

    /// Site-relative URL (`/blog/spring-boot-test/`)
    pub url: String,
    /// Absolute URL
    pub permalink: String,
}

//! Renderer - turns documents into rendered pages
//!
//! Rendering is a pure function of the document, the layouts and the site
//! configuration: nothing time- or environment-dependent reaches the output,
//! so rendering the same input twice yields byte-identical pages.

mod page;

use chrono_tz::Tz;
use serde::Serialize;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{Document, FrontMatter, MarkdownRenderer, Slug, TocEntry};
use crate::error::DocumentError;
use crate::helpers::{full_url_for, strip_html, url_for};
use crate::templates::{error_chain, Layouts};

pub use page::RenderedPage;

/// `page` variable exposed to layouts
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    title: &'a str,
    slug: &'a Slug,
    url: &'a str,
    permalink: &'a str,
    date: Option<String>,
    modified: Option<String>,
    authors: Vec<String>,
    categories: Vec<String>,
    excerpt: Option<&'a str>,
    image: Option<String>,
    comments: bool,
    content: &'a str,
    toc: &'a [TocEntry],
    layout: &'a str,
    source: &'a str,
}

/// `site` variable exposed to layouts
#[derive(Debug, Serialize)]
struct SiteContext<'a> {
    title: &'a str,
    description: &'a str,
    author: &'a str,
    url: &'a str,
    root: &'a str,
    language: &'a str,
}

/// Renders documents through Markdown and a layout
pub struct Renderer {
    config: SiteConfig,
    tz: Tz,
    markdown: MarkdownRenderer,
    layouts: Layouts,
}

impl Renderer {
    pub fn new(config: &SiteConfig, layouts: Layouts) -> Self {
        Self {
            config: config.clone(),
            tz: config.tz(),
            markdown: MarkdownRenderer::with_options(&config.highlight),
            layouts,
        }
    }

    /// Layout a document would be rendered with
    pub fn layout_for(&self, doc: &Document) -> String {
        doc.front_matter
            .layout()
            .unwrap_or_else(|| self.config.default_layout.clone())
    }

    /// Check everything that does not need Markdown conversion: required
    /// fields, the slug and the layout
    pub fn validate(&self, doc: &Document) -> Result<(String, Slug, String), DocumentError> {
        let title = doc.title()?;
        let url = doc.url()?;
        let slug = Slug::parse(&url).map_err(|source| DocumentError::InvalidSlug {
            path: doc.path.clone(),
            source,
        })?;

        let layout = self.layout_for(doc);
        if !self.layouts.contains(&layout) {
            return Err(DocumentError::Render {
                path: doc.path.clone(),
                layout,
                reason: "layout not found".to_string(),
            });
        }

        Ok((title, slug, layout))
    }

    /// Render a document into a page
    pub fn render(&self, doc: &Document) -> Result<RenderedPage, DocumentError> {
        let (title, slug, layout) = self.validate(doc)?;
        let fm = &doc.front_matter;

        let (more_excerpt, full_body) = MarkdownRenderer::split_excerpt(&doc.body);
        let rendered = self.markdown.render(&full_body);

        let excerpt = fm.excerpt().or_else(|| {
            more_excerpt
                .map(|md| strip_html(&self.markdown.render(&md).html).trim().to_string())
                .filter(|s| !s.is_empty())
        });

        let date = fm.date(self.tz);
        if date.is_none() && fm.get("date").is_some() {
            tracing::warn!("Unrecognized date in {:?}, ignoring it", doc.path);
        }
        let modified = fm.modified(self.tz);

        let path = slug.url_path(self.config.pretty_urls);
        let url = url_for(&self.config, &path);
        let permalink = full_url_for(&self.config, &path);

        let page = PageContext {
            title: &title,
            slug: &slug,
            url: &url,
            permalink: &permalink,
            date: date.map(|d| d.to_rfc3339()),
            modified: modified.map(|d| d.to_rfc3339()),
            authors: fm.authors(),
            categories: fm.categories(),
            excerpt: excerpt.as_deref(),
            image: fm.image().map(|image| full_url_for(&self.config, &image)),
            comments: fm.comments_enabled(),
            content: &rendered.html,
            toc: &rendered.toc,
            layout: &layout,
            source: &doc.source,
        };

        let context = self.context(&page, fm);
        let html_body =
            self.layouts
                .render(&layout, &context)
                .map_err(|e| DocumentError::Render {
                    path: doc.path.clone(),
                    layout: layout.clone(),
                    reason: error_chain(&e),
                })?;

        Ok(RenderedPage {
            slug,
            html_body,
            content: rendered.html,
            layout,
            source: doc.path.clone(),
            title,
            date,
            modified,
            excerpt,
            url,
            permalink,
        })
    }

    fn context(&self, page: &PageContext<'_>, front_matter: &FrontMatter) -> Context {
        let site = SiteContext {
            title: &self.config.title,
            description: &self.config.description,
            author: &self.config.author,
            url: &self.config.url,
            root: &self.config.root,
            language: &self.config.language,
        };

        let mut context = Context::new();
        context.insert("page", page);
        context.insert("front_matter", front_matter);
        context.insert("site", &site);
        context
    }
}

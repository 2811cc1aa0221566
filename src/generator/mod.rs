//! Generator module - runs the build pipeline and writes the output tree
//!
//! Load → parse → render → claim slug and output path → write. Per-document
//! problems are recorded in the [`BuildReport`] and never stop the build;
//! strict mode turns any of them into a fatal error before anything is
//! written.

mod feed;
mod registry;
mod report;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::content::loader::is_markdown_file;
use crate::content::{ContentFilter, ContentLoader, Document};
use crate::error::{BuildError, DocumentError, SlugConflict};
use crate::renderer::{RenderedPage, Renderer};
use crate::templates::Layouts;
use crate::Site;

pub use feed::{atom_feed, search_index};
pub use registry::SlugRegistry;
pub use report::BuildReport;

/// Build options
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Fail on any duplicate slug or per-document issue
    pub strict: bool,
}

/// What a build would write, decided before touching the output directory
#[derive(Debug)]
pub struct BuildPlan {
    /// One outcome per discovered document, in load order
    pub outcomes: Vec<Result<RenderedPage, DocumentError>>,
    /// Assets to copy, relative to the input directory
    pub assets: Vec<PathBuf>,
    /// Slugs claimed by more than one document
    pub conflicts: Vec<SlugConflict>,
}

/// Static site generator
pub struct Generator {
    site: Site,
    renderer: Renderer,
}

impl Generator {
    /// Create a generator, compiling the site's layouts
    pub fn new(site: &Site) -> Result<Self, BuildError> {
        let layouts = Layouts::load(site.layouts_dir())?;
        tracing::debug!("Available layouts: {}", layouts.names().join(", "));
        let renderer = Renderer::new(&site.config, layouts);

        Ok(Self {
            site: site.clone(),
            renderer,
        })
    }

    /// Render every document and settle who owns each output path.
    ///
    /// Site artifacts (feed, search index) are reserved first, then copied
    /// assets, then pages in load order. A page whose slug or output path is
    /// already taken becomes a per-document issue.
    pub fn plan(&self) -> Result<BuildPlan, BuildError> {
        let filter = self.site.content_filter()?;
        let loader = ContentLoader::new(&self.site.input_dir, filter.clone())?;
        let pretty_urls = self.site.config.pretty_urls;

        let mut registry = SlugRegistry::new();
        for artifact in self.artifacts() {
            if let Err(owner) = registry.reserve(&artifact, &artifact) {
                tracing::warn!("{:?} overlaps {:?}, one will overwrite the other", artifact, owner);
            }
        }
        let assets = self.collect_assets(&filter, &mut registry);

        let outcomes = loader
            .sources()
            .map(|source| -> Result<RenderedPage, DocumentError> {
                let page = source
                    .and_then(Document::parse)
                    .and_then(|doc| self.renderer.render(&doc))?;
                registry.claim(&page.slug, &page.slug.output_path(pretty_urls), &page.source)?;
                Ok(page)
            })
            .collect();

        Ok(BuildPlan {
            outcomes,
            assets,
            conflicts: registry.conflicts(),
        })
    }

    /// Run a full build
    pub fn build(&self, options: BuildOptions) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let plan = self.plan()?;

        let mut report = BuildReport::default();
        let mut pages = Vec::new();
        for outcome in plan.outcomes {
            report.processed += 1;
            match outcome {
                Ok(page) => pages.push(page),
                Err(issue) => report.record(issue),
            }
        }

        if options.strict {
            if !plan.conflicts.is_empty() {
                return Err(BuildError::DuplicateSlugs(plan.conflicts));
            }
            if report.has_issues() {
                return Err(BuildError::Strict {
                    skipped: report.skipped,
                    failed: report.failed,
                });
            }
        }

        let output = &self.site.output_dir;
        fs::create_dir_all(output).map_err(|e| BuildError::io(output, e))?;

        report.assets = self.copy_assets(&plan.assets)?;
        report.rendered = self.write_pages(&pages)?;
        self.write_feed(&pages)?;
        self.write_search_index(&pages)?;

        tracing::info!(
            "Built {} in {:.2}s",
            report,
            start.elapsed().as_secs_f64()
        );
        Ok(report)
    }

    /// Output paths of the enabled site artifacts
    fn artifacts(&self) -> Vec<PathBuf> {
        let config = &self.site.config;
        let mut artifacts = Vec::new();
        if config.feed.enable {
            artifacts.push(artifact_path(&config.feed.path));
        }
        if config.search_index.enable {
            artifacts.push(artifact_path(&config.search_index.path));
        }
        artifacts
    }

    /// Every non-Markdown content file whose output path is free
    fn collect_assets(&self, filter: &ContentFilter, registry: &mut SlugRegistry) -> Vec<PathBuf> {
        let input = &self.site.input_dir;
        let mut assets = Vec::new();

        for entry in filter.walk(input) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping asset: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || is_markdown_file(path) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(input) else {
                continue;
            };
            match registry.reserve(relative, path) {
                Ok(()) => assets.push(relative.to_path_buf()),
                Err(owner) => {
                    tracing::warn!("Skipping asset {:?}: its output is taken by {:?}", path, owner)
                }
            }
        }

        assets
    }

    fn write_pages(&self, pages: &[RenderedPage]) -> Result<usize, BuildError> {
        let pretty_urls = self.site.config.pretty_urls;
        for page in pages {
            let output_path = self.site.output_dir.join(page.slug.output_path(pretty_urls));
            write_file(&output_path, page.html_body.as_bytes())?;
            tracing::debug!("Generated: {:?}", output_path);
        }
        Ok(pages.len())
    }

    /// Copy planned assets verbatim
    fn copy_assets(&self, assets: &[PathBuf]) -> Result<usize, BuildError> {
        let mut copied = 0;

        for relative in assets {
            let path = self.site.input_dir.join(relative);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Skipping unreadable asset {:?}: {}", path, e);
                    continue;
                }
            };
            let dest = self.site.output_dir.join(relative);
            write_file(&dest, &bytes)?;
            tracing::debug!("Copied: {:?}", dest);
            copied += 1;
        }

        Ok(copied)
    }

    fn write_feed(&self, pages: &[RenderedPage]) -> Result<(), BuildError> {
        let config = &self.site.config;
        if !config.feed.enable {
            return Ok(());
        }
        match atom_feed(config, pages) {
            Some(feed) => {
                let output_path = self.site.output_dir.join(artifact_path(&config.feed.path));
                write_file(&output_path, feed.as_bytes())?;
                tracing::info!("Generated {}", config.feed.path);
            }
            None => tracing::debug!("No dated pages, skipping {}", config.feed.path),
        }
        Ok(())
    }

    fn write_search_index(&self, pages: &[RenderedPage]) -> Result<(), BuildError> {
        let config = &self.site.config.search_index;
        if !config.enable {
            return Ok(());
        }
        let output_path = self.site.output_dir.join(artifact_path(&config.path));
        let json = search_index(pages).map_err(|e| {
            BuildError::io(
                &output_path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        write_file(&output_path, json.as_bytes())?;
        tracing::info!("Generated {}", config.path);
        Ok(())
    }
}

/// Configured artifact path relative to the output directory
fn artifact_path(configured: &str) -> PathBuf {
    PathBuf::from(configured.trim_start_matches('/'))
}

/// Write a file, creating parent directories
fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| BuildError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site(dir: &TempDir) -> Site {
        Site::with_config(
            SiteConfig::default(),
            dir.path().join("content"),
            dir.path().join("public"),
        )
    }

    #[test]
    fn test_build_writes_pages_and_assets() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "index.md", "---\ntitle: Home\nurl: /\n---\nWelcome");
        write(
            &content,
            "posts/hello.md",
            "---\ntitle: Hello\nurl: blog/hello\ndate: 2023-05-30\n---\nHi",
        );
        write(&content, "images/logo.png", "png");
        write(&content, "_drafts/wip.md", "---\ntitle: WIP\nurl: wip\n---\n");

        let report = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.rendered, 2);
        assert_eq!(report.assets, 1);
        let public = dir.path().join("public");
        assert!(public.join("index.html").is_file());
        assert!(public.join("blog/hello/index.html").is_file());
        assert!(public.join("images/logo.png").is_file());
        assert!(public.join("atom.xml").is_file());
        assert!(!public.join("search.json").exists());
        assert!(!public.join("wip").exists());
    }

    #[test]
    fn test_failed_documents_do_not_stop_the_build() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "a.md", "---\ntitle: A\nurl: a\n---\n");
        write(&content, "b.md", "---\ntitle: B\n---\n");
        write(&content, "c.md", "---\ntitle: C\nurl: c\nlayout: nope\n---\n");
        write(&content, "d.md", "---\ntitle: D\nurl: d\n");

        let report = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.skipped, 1);
        assert!(dir.path().join("public/a/index.html").is_file());
    }

    #[test]
    fn test_strict_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "a.md", "---\ntitle: A\nurl: a\n---\n");
        write(&content, "b.md", "---\ntitle: B\n---\n");

        let err = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions { strict: true })
            .unwrap_err();

        assert!(matches!(err, BuildError::Strict { skipped: 0, failed: 1 }));
        assert!(!dir.path().join("public").exists());
    }

    #[test]
    fn test_nested_output_is_not_content() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\nurl: a\n---\n");
        let site = Site::with_config(
            SiteConfig::default(),
            dir.path().to_path_buf(),
            dir.path().join("public"),
        );
        let generator = Generator::new(&site).unwrap();

        generator.build(BuildOptions::default()).unwrap();
        let report = generator.build(BuildOptions::default()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.assets, 0);
    }

    #[test]
    fn test_search_index_when_enabled() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "a.md", "---\ntitle: A\nurl: a\n---\nBody");

        let mut config = SiteConfig::default();
        config.search_index.enable = true;
        config.feed.enable = false;
        let site = Site::with_config(config, content, dir.path().join("public"));

        Generator::new(&site)
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();
        assert!(dir.path().join("public/search.json").is_file());
        assert!(!dir.path().join("public/atom.xml").exists());
    }

    #[test]
    fn test_page_on_feed_path_is_skipped() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(
            &content,
            "a.md",
            "---\ntitle: Sneaky\nurl: atom.xml\ndate: 2023-01-01\n---\n",
        );
        write(
            &content,
            "b.md",
            "---\ntitle: Post\nurl: post\ndate: 2023-05-30\n---\nBody",
        );

        let report = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();

        assert_eq!(report.rendered, 1);
        assert_eq!(report.skipped, 1);
        match &report.issues[0] {
            DocumentError::OutputConflict { output, owner, .. } => {
                assert_eq!(output, &PathBuf::from("atom.xml/index.html"));
                assert_eq!(owner, &PathBuf::from("atom.xml"));
            }
            other => panic!("expected output conflict, got {other}"),
        }
        let public = dir.path().join("public");
        assert!(public.join("atom.xml").is_file());
        assert!(public.join("post/index.html").is_file());
    }

    #[test]
    fn test_page_on_asset_path_is_skipped() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "hello", "plain file");
        write(&content, "hello.md", "---\ntitle: Hello\nurl: hello\n---\n");
        write(&content, "other.md", "---\ntitle: Other\nurl: other\n---\n");

        let report = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.rendered, 1);
        assert_eq!(report.assets, 1);
        assert!(matches!(
            report.issues.as_slice(),
            [DocumentError::OutputConflict { .. }]
        ));
        let public = dir.path().join("public");
        assert_eq!(fs::read_to_string(public.join("hello")).unwrap(), "plain file");
        assert!(public.join("other/index.html").is_file());
    }

    #[test]
    fn test_nested_page_paths_conflict() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "a.md", "---\ntitle: A\nurl: a\n---\n");
        write(&content, "b.md", "---\ntitle: B\nurl: a/index.html\n---\n");

        let report = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions::default())
            .unwrap();

        assert_eq!(report.rendered, 1);
        assert_eq!(report.skipped, 1);
        assert!(dir.path().join("public/a/index.html").is_file());
    }

    #[test]
    fn test_output_conflict_is_fatal_in_strict_mode() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "hello", "plain file");
        write(&content, "hello.md", "---\ntitle: Hello\nurl: hello\n---\n");

        let err = Generator::new(&site(&dir))
            .unwrap()
            .build(BuildOptions { strict: true })
            .unwrap_err();

        assert!(matches!(err, BuildError::Strict { skipped: 1, failed: 0 }));
        assert!(!dir.path().join("public").exists());
    }

    #[test]
    fn test_plan_claims_slugs_after_rendering() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(&content, "a.md", "---\ntitle: A\nurl: same\nlayout: nope\n---\n");
        write(&content, "b.md", "---\ntitle: B\nurl: same\n---\n");

        let plan = Generator::new(&site(&dir)).unwrap().plan().unwrap();

        assert!(matches!(plan.outcomes[0], Err(DocumentError::Render { .. })));
        let page = plan.outcomes[1].as_ref().unwrap();
        assert_eq!(page.slug.as_str(), "same");
        assert!(plan.conflicts.is_empty());
    }
}

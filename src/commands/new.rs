//! Create a new document

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::content::{FrontMatter, Slug};
use crate::Site;

/// Scaffold a document under the input directory and return its path.
///
/// The `url` defaults to the slugified title; the file lands at the matching
/// path (`blog/hello` → `blog/hello.md`). Existing files are never overwritten.
pub fn create_document(
    site: &Site,
    title: &str,
    layout: Option<&str>,
    url: Option<&str>,
) -> Result<PathBuf> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("Title must not be empty");
    }

    let url = match url {
        Some(url) => url.to_string(),
        None => slug::slugify(title),
    };
    let slug = Slug::parse(&url).with_context(|| format!("invalid url {:?}", url))?;

    let mut relative: PathBuf = slug.segments().collect();
    if slug.is_root() {
        relative.push("index");
    }
    let file_name = format!(
        "{}.md",
        relative.file_name().unwrap_or_default().to_string_lossy()
    );
    relative.set_file_name(file_name);
    let file_path = site.input_dir.join(relative);

    let now = chrono::Utc::now().with_timezone(&site.config.tz());
    let mut front_matter = FrontMatter::default();
    front_matter.insert("title", title);
    front_matter.insert("date", now.format("%Y-%m-%d %H:%M:%S").to_string());
    front_matter.insert("url", slug.to_string());
    if let Some(layout) = layout {
        front_matter.insert("layout", layout);
    }
    let content = front_matter.to_block()?;

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&file_path)
        .with_context(|| format!("cannot create {:?}", file_path))?;
    file.write_all(content.as_bytes())?;

    Ok(file_path)
}

/// Run the new command
pub fn run(site: &Site, title: &str, layout: Option<&str>, url: Option<&str>) -> Result<()> {
    let path = create_document(site, title, layout, url)?;
    println!("Created: {:?}", path);
    Ok(())
}

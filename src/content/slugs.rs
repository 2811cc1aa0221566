//! Page slugs derived from the `url` front-matter field

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::error::SlugError;

/// Characters escaped inside a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Normalized URL path of a page, without leading or trailing slashes.
/// The empty slug is the site root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    /// Normalize a `url` value.
    ///
    /// `/spring-boot-test/`, `spring-boot-test` and ` spring-boot-test ` all
    /// name the same page.
    pub fn parse(url: &str) -> Result<Self, SlugError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SlugError::Empty);
        }

        let mut segments = Vec::new();
        for segment in url.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(SlugError::ForbiddenSegment(segment.to_string()));
            }
            if let Some(c) = segment.chars().find(|c| *c == '\\' || c.is_control()) {
                return Err(SlugError::InvalidCharacter(c));
            }
            segments.push(segment);
        }

        Ok(Slug(segments.join("/")))
    }

    pub fn root() -> Self {
        Slug(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Output file relative to the output directory
    pub fn output_path(&self, pretty_urls: bool) -> PathBuf {
        if self.is_root() {
            return PathBuf::from("index.html");
        }
        if pretty_urls {
            let mut path: PathBuf = self.segments().collect();
            path.push("index.html");
            return path;
        }
        // The last segment may itself contain dots (`release-1.2`)
        let (dir, name) = self.0.rsplit_once('/').unwrap_or(("", &self.0));
        let mut path: PathBuf = dir.split('/').filter(|s| !s.is_empty()).collect();
        path.push(format!("{name}.html"));
        path
    }

    /// Site-relative URL path, percent-encoded, always starting with `/`
    pub fn url_path(&self, pretty_urls: bool) -> String {
        if self.is_root() {
            return "/".to_string();
        }
        let encoded: Vec<String> = self
            .segments()
            .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
            .collect();
        if pretty_urls {
            format!("/{}/", encoded.join("/"))
        } else {
            format!("/{}.html", encoded.join("/"))
        }
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl Serialize for Slug {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

//! Content loader - enumerates source documents under the content root

use glob::{MatchOptions, Pattern, PatternError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::{BuildError, DocumentError};

/// A source file read from the content tree
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Full path on disk
    pub path: PathBuf,
    /// Path relative to the content root, `/`-separated
    pub source: String,
    /// Raw file contents
    pub raw: String,
}

/// Decides which entries under the content root are content.
///
/// Anything below a `_` or `.` prefixed component is reserved (`_layouts/`,
/// `_config.yml`, `.git/`); exclude globs and skipped directories come from
/// the site.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    excludes: Vec<Pattern>,
    skip_dirs: Vec<PathBuf>,
}

impl ContentFilter {
    /// Compile exclude patterns (relative to the content root)
    pub fn new(excludes: &[String]) -> Result<Self, PatternError> {
        let excludes = excludes
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            excludes,
            skip_dirs: Vec::new(),
        })
    }

    /// Never descend into `relative` (e.g. an output directory nested in the
    /// content root)
    pub fn skip_dir(mut self, relative: impl Into<PathBuf>) -> Self {
        self.skip_dirs.push(relative.into());
        self
    }

    /// Whether a path relative to the content root is content
    pub fn accepts(&self, relative: &Path) -> bool {
        let reserved = relative.components().any(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .map(|s| s.starts_with('_') || s.starts_with('.'))
                .unwrap_or(true),
            _ => false,
        });
        if reserved {
            return false;
        }

        if self.skip_dirs.iter().any(|dir| relative.starts_with(dir)) {
            return false;
        }

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        !self
            .excludes
            .iter()
            .any(|p| p.matches_path_with(relative, options))
    }

    /// Walk every accepted file under `root` in a stable order
    pub fn walk<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = walkdir::Result<DirEntry>> + 'a {
        WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|relative| self.accepts(relative))
                        .unwrap_or(false)
            })
    }
}

/// Loads Markdown documents from the content root
pub struct ContentLoader {
    root: PathBuf,
    filter: ContentFilter,
}

impl ContentLoader {
    /// Create a loader, checking that the content root is a readable directory
    pub fn new<P: AsRef<Path>>(root: P, filter: ContentFilter) -> Result<Self, BuildError> {
        let root = root.as_ref().to_path_buf();

        let metadata = fs::metadata(&root).map_err(|e| BuildError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(BuildError::io(
                &root,
                io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        fs::read_dir(&root).map_err(|e| BuildError::io(&root, e))?;

        Ok(Self { root, filter })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily enumerate every Markdown file. Each call starts a fresh walk.
    ///
    /// Files that cannot be read come back as [`DocumentError::Unreadable`];
    /// the caller decides how to report them.
    pub fn sources(&self) -> impl Iterator<Item = Result<SourceFile, DocumentError>> + '_ {
        self.filter
            .walk(&self.root)
            .filter_map(move |entry| match entry {
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Some(Err(DocumentError::Unreadable {
                        path,
                        reason: e.to_string(),
                    }))
                }
                Ok(entry) if entry.file_type().is_file() && is_markdown_file(entry.path()) => {
                    Some(self.read(entry.path()))
                }
                Ok(_) => None,
            })
    }

    fn read(&self, path: &Path) -> Result<SourceFile, DocumentError> {
        let unreadable = |reason: String| DocumentError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        let raw = String::from_utf8(bytes).map_err(|_| unreadable("not valid UTF-8".to_string()))?;

        Ok(SourceFile {
            path: path.to_path_buf(),
            source: relative_source(&self.root, path),
            raw,
        })
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

/// Relative, `/`-separated path of `path` under `root`
pub fn relative_source(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

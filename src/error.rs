//! Error types for the build pipeline
//!
//! Errors come in two tiers. [`DocumentError`] covers everything that can go
//! wrong with a single document; those are collected into the build report
//! and never stop the rest of the site from building. [`BuildError`] is fatal
//! and aborts the whole run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Front-matter parsing errors (no path attached yet)
#[derive(Error, Debug)]
pub enum FrontMatterError {
    #[error("missing closing `---` delimiter")]
    MissingClosingDelimiter,

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),

    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("failed to serialize front matter: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Slug validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("url is empty")]
    Empty,

    #[error("url segment `{0}` is not allowed")]
    ForbiddenSegment(String),

    #[error("url contains an invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Per-document errors. The document is dropped from the build; every other
/// document keeps going.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("malformed front matter in {path:?}: {source}")]
    MalformedFrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("{path:?} has no `{field}` in its front matter")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("invalid url in {path:?}: {source}")]
    InvalidSlug {
        path: PathBuf,
        #[source]
        source: SlugError,
    },

    #[error("failed to render {path:?} with layout `{layout}`: {reason}")]
    Render {
        path: PathBuf,
        layout: String,
        reason: String,
    },

    #[error("{path:?} claims slug `{slug}` already taken by {winner:?}")]
    DuplicateSlug {
        path: PathBuf,
        slug: String,
        winner: PathBuf,
    },

    #[error("{path:?} would write {output:?}, which is already taken by {owner:?}")]
    OutputConflict {
        path: PathBuf,
        /// Output path relative to the output directory
        output: PathBuf,
        owner: PathBuf,
    },
}

impl DocumentError {
    /// Source path of the offending document
    pub fn path(&self) -> &PathBuf {
        match self {
            DocumentError::Unreadable { path, .. }
            | DocumentError::MalformedFrontMatter { path, .. }
            | DocumentError::MissingField { path, .. }
            | DocumentError::InvalidSlug { path, .. }
            | DocumentError::Render { path, .. }
            | DocumentError::DuplicateSlug { path, .. }
            | DocumentError::OutputConflict { path, .. } => path,
        }
    }

    /// Whether the document was skipped before rendering (as opposed to
    /// failing while being rendered)
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            DocumentError::Unreadable { .. }
                | DocumentError::MalformedFrontMatter { .. }
                | DocumentError::DuplicateSlug { .. }
                | DocumentError::OutputConflict { .. }
        )
    }
}

/// A slug claimed by more than one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugConflict {
    pub slug: String,
    /// Every claimant in load order; the first one is the page that was kept
    pub paths: Vec<PathBuf>,
}

impl fmt::Display for SlugConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(f, "`{}` ({})", self.slug, paths.join(", "))
    }
}

/// Fatal build errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("failed to load layouts from {path:?}: {reason}")]
    Layouts { path: PathBuf, reason: String },

    #[error("duplicate slugs: {}", join_conflicts(.0))]
    DuplicateSlugs(Vec<SlugConflict>),

    #[error("strict mode: {skipped} document(s) skipped and {failed} failed")]
    Strict { skipped: usize, failed: usize },
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_conflicts(conflicts: &[SlugConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

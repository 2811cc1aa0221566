//! Source documents

use std::path::PathBuf;

use super::loader::SourceFile;
use super::FrontMatter;
use crate::error::DocumentError;

/// A Markdown document split into front matter and body
#[derive(Debug, Clone)]
pub struct Document {
    /// Full source path
    pub path: PathBuf,
    /// Path relative to the content root
    pub source: String,
    pub front_matter: FrontMatter,
    /// Raw Markdown following the front matter
    pub body: String,
}

impl Document {
    /// Parse a loaded source file
    pub fn parse(file: SourceFile) -> Result<Self, DocumentError> {
        let (front_matter, body) =
            FrontMatter::parse(&file.raw).map_err(|source| DocumentError::MalformedFrontMatter {
                path: file.path.clone(),
                source,
            })?;
        let body = body.to_string();

        Ok(Self {
            path: file.path,
            source: file.source,
            front_matter,
            body,
        })
    }

    /// Non-empty `title`, required to render
    pub fn title(&self) -> Result<String, DocumentError> {
        self.front_matter
            .title()
            .ok_or_else(|| DocumentError::MissingField {
                path: self.path.clone(),
                field: "title",
            })
    }

    pub fn url(&self) -> Result<String, DocumentError> {
        self.front_matter
            .url()
            .ok_or_else(|| DocumentError::MissingField {
                path: self.path.clone(),
                field: "url",
            })
    }
}

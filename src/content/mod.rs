//! Content module - loading, front matter, and Markdown processing

mod document;
mod frontmatter;
pub mod loader;
mod markdown;
mod slugs;

pub use document::Document;
pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::{ContentFilter, ContentLoader, SourceFile};
pub use markdown::{MarkdownRenderer, RenderedMarkdown, TocEntry, MORE_MARKER};
pub use slugs::Slug;

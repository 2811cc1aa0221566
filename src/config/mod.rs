//! Configuration module

mod site;

pub use site::FeedConfig;
pub use site::HighlightConfig;
pub use site::SearchIndexConfig;
pub use site::SiteConfig;

//! Site URL construction

use crate::config::SiteConfig;

/// Whether `path` already names a full URL (`https://...`, `//cdn...`)
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("//") || path.contains("://")
}

/// Prefix a site path with the configured `root`.
/// `url_for(&config, "img/a.png")` with root `/blog/` gives `/blog/img/a.png`.
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    let root = config.root.trim_matches('/');
    let path = path.trim_start_matches('/');

    match (root.is_empty(), path.is_empty()) {
        (true, _) => format!("/{}", path),
        (false, true) => format!("/{}/", root),
        (false, false) => format!("/{}/{}", root, path),
    }
}

/// Absolute URL of a site path, built on the configured `url`
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    format!("{}{}", config.url.trim_end_matches('/'), url_for(config, path))
}

//! HTML and XML text helpers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `href="/...` / `src='/...` attributes pointing at site-relative URLs
    static ref ROOT_RELATIVE_URL: Regex =
        Regex::new(r#"\b(href|src)=(["'])/([^/])"#).expect("valid regex");
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strip HTML tags from a string
pub fn strip_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;

    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate a string to at most `length` characters, including the omission
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.chars().count()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}

/// Rewrite site-relative `href`/`src` attributes to absolute URLs.
/// Protocol-relative URLs (`//cdn...`) are left alone.
pub fn absolutize_urls(html: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    ROOT_RELATIVE_URL
        .replace_all(html, |caps: &regex::Captures| {
            format!("{}={}{}/{}", &caps[1], &caps[2], base, &caps[3])
        })
        .into_owned()
}

/// Strip characters XML 1.0 does not allow
pub fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

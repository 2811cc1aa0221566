//! Site-level artifacts: Atom feed and search index

use serde::Serialize;

use crate::config::SiteConfig;
use crate::helpers::{
    absolutize_urls, escape_xml, full_url_for, strip_html, strip_invalid_xml_chars,
};
use crate::renderer::RenderedPage;

/// Build the Atom feed from dated pages, newest first.
///
/// Returns `None` when no page carries a date. The feed's `<updated>` is the
/// newest entry's date so the same input always produces the same feed.
pub fn atom_feed(config: &SiteConfig, pages: &[RenderedPage]) -> Option<String> {
    let mut dated: Vec<&RenderedPage> = pages.iter().filter(|p| p.date.is_some()).collect();
    dated.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
    dated.truncate(config.feed.limit);

    let updated = dated.iter().filter_map(|p| p.modified.max(p.date)).max()?;
    let base_url = config.url.trim_end_matches('/');
    let home = full_url_for(config, "/");

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.description.is_empty() {
        feed.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.description)
        ));
    }
    feed.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        escape_xml(&full_url_for(config, &config.feed.path))
    ));
    feed.push_str(&format!("  <link href=\"{}\"/>\n", escape_xml(&home)));
    feed.push_str(&format!("  <updated>{}</updated>\n", updated.to_rfc3339()));
    feed.push_str(&format!("  <id>{}</id>\n", escape_xml(&home)));
    if !config.author.is_empty() {
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&config.author)
        ));
    }

    for page in dated {
        let Some(date) = page.date else { continue };
        let permalink = escape_xml(&page.permalink);

        feed.push_str("  <entry>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&page.title)));
        feed.push_str(&format!("    <link href=\"{}\"/>\n", permalink));
        feed.push_str(&format!("    <id>{}</id>\n", permalink));
        feed.push_str(&format!("    <published>{}</published>\n", date.to_rfc3339()));
        feed.push_str(&format!(
            "    <updated>{}</updated>\n",
            page.modified.unwrap_or(date).to_rfc3339()
        ));
        if let Some(excerpt) = &page.excerpt {
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(&strip_invalid_xml_chars(excerpt))
            ));
        }
        let content = strip_invalid_xml_chars(&absolutize_urls(&page.content, base_url));
        // `]]>` would end the CDATA section early
        let content = content.replace("]]>", "]]]]><![CDATA[>");
        feed.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            content
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    Some(feed)
}

#[derive(Debug, Serialize)]
struct SearchEntry<'a> {
    title: &'a str,
    url: &'a str,
    date: Option<String>,
    content: String,
}

/// Build the JSON search index, ordered by slug
pub fn search_index(pages: &[RenderedPage]) -> Result<String, serde_json::Error> {
    let mut sorted: Vec<&RenderedPage> = pages.iter().collect();
    sorted.sort_by(|a, b| a.slug.cmp(&b.slug));

    let entries: Vec<SearchEntry> = sorted
        .into_iter()
        .map(|p| SearchEntry {
            title: &p.title,
            url: &p.url,
            date: p.date.map(|d| d.format("%Y-%m-%d").to_string()),
            content: strip_html(&p.content).trim().to_string(),
        })
        .collect();

    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse_date_string, Slug};
    use chrono_tz::Tz;
    use std::path::PathBuf;

    fn page(slug: &str, title: &str, date: Option<&str>) -> RenderedPage {
        let slug = Slug::parse(slug).unwrap();
        let url = slug.url_path(true);
        RenderedPage {
            permalink: format!("https://example.com{}", url),
            url,
            slug,
            html_body: String::new(),
            content: r#"<p>See <a href="/other/">other</a> & more</p>"#.to_string(),
            layout: "default".to_string(),
            source: PathBuf::from(format!("{}.md", title)),
            title: title.to_string(),
            date: date.and_then(|d| parse_date_string(d, Tz::UTC)),
            modified: None,
            excerpt: None,
        }
    }

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Tom & Co".to_string(),
            url: "https://example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_feed_orders_newest_first_and_skips_undated() {
        let pages = vec![
            page("old", "Old", Some("2020-01-01")),
            page("about", "About", None),
            page("new", "New", Some("2023-05-30")),
        ];
        let feed = atom_feed(&config(), &pages).unwrap();

        assert!(feed.contains("<title>Tom &amp; Co</title>"));
        assert!(feed.contains("<updated>2023-05-30T00:00:00+00:00</updated>"));
        assert!(!feed.contains("About"));
        let new = feed.find("<title>New</title>").unwrap();
        let old = feed.find("<title>Old</title>").unwrap();
        assert!(new < old);
        assert!(feed.contains(r#"href="https://example.com/other/""#));
    }

    #[test]
    fn test_feed_limit_and_ties() {
        let mut config = config();
        config.feed.limit = 2;
        let pages = vec![
            page("c", "C", Some("2021-01-01")),
            page("b", "B", Some("2021-01-01")),
            page("a", "A", Some("2021-01-01")),
        ];
        let feed = atom_feed(&config, &pages).unwrap();
        assert_eq!(feed.matches("<entry>").count(), 2);
        assert!(feed.find("<title>A</title>").unwrap() < feed.find("<title>B</title>").unwrap());
        assert!(!feed.contains("<title>C</title>"));
    }

    #[test]
    fn test_no_dated_pages_no_feed() {
        assert!(atom_feed(&config(), &[page("about", "About", None)]).is_none());
    }

    #[test]
    fn test_search_index() {
        let pages = vec![
            page("zeta", "Zeta", None),
            page("alpha", "Alpha", Some("2022-02-02")),
        ];
        let json: serde_json::Value =
            serde_json::from_str(&search_index(&pages).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries[0]["title"], "Alpha");
        assert_eq!(entries[0]["url"], "/alpha/");
        assert_eq!(entries[0]["date"], "2022-02-02");
        assert_eq!(entries[0]["content"], "See other & more");
        assert_eq!(entries[1]["date"], serde_json::Value::Null);
    }
}

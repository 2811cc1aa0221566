//! Page layouts using the Tera template engine
//!
//! A built-in `default` layout is embedded in the binary. Every `*.html` file
//! under the site's layouts directory is registered too, keyed by its path
//! relative to that directory, so layouts can `{% extends %}` or
//! `{% include %}` each other. A user `default.html` replaces the built-in.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::content::loader::relative_source;
use crate::error::BuildError;

/// Name of the built-in layout
pub const DEFAULT_LAYOUT: &str = "default";

const DEFAULT_TEMPLATE: &str = include_str!("default.html");

/// Set of compiled layouts
pub struct Layouts {
    tera: Tera,
}

impl Layouts {
    /// Only the built-in layout
    pub fn builtin() -> Result<Self, tera::Error> {
        Self::from_templates(Vec::new())
    }

    /// Built-in layout plus every `*.html` file under `dir` (if it exists)
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, BuildError> {
        let dir = dir.as_ref();
        let layouts_error = |reason: String| BuildError::Layouts {
            path: dir.to_path_buf(),
            reason,
        };

        let mut templates = Vec::new();
        if dir.is_dir() {
            for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|e| layouts_error(e.to_string()))?;
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some("html")
                {
                    continue;
                }
                let content = fs::read_to_string(path)
                    .map_err(|e| layouts_error(format!("{}: {}", path.display(), e)))?;
                templates.push((relative_source(dir, path), content));
            }
        }

        let count = templates.len();
        let layouts = Self::from_templates(templates).map_err(|e| layouts_error(error_chain(&e)))?;
        tracing::debug!("Loaded {} layout template(s) from {:?}", count, dir);
        Ok(layouts)
    }

    fn from_templates(mut templates: Vec<(String, String)>) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();

        // Page content is already HTML; layouts escape explicitly with `| escape`
        tera.autoescape_on(vec![]);

        let default_name = template_name(DEFAULT_LAYOUT);
        if !templates.iter().any(|(name, _)| *name == default_name) {
            templates.insert(0, (default_name, DEFAULT_TEMPLATE.to_string()));
        }
        tera.add_raw_templates(templates)?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Whether a layout with this name exists
    pub fn contains(&self, layout: &str) -> bool {
        let name = template_name(layout);
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Names of all layouts, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tera
            .get_template_names()
            .filter_map(|n| n.strip_suffix(".html"))
            .map(ToString::to_string)
            .collect();
        names.sort();
        names
    }

    /// Render a layout with the given context
    pub fn render(&self, layout: &str, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(&template_name(layout), context)
    }
}

fn template_name(layout: &str) -> String {
    format!("{}.html", layout)
}

/// Flatten an error and its sources into one line. Tera keeps the useful
/// detail (line, variable name) in the source chain.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(crate::helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(crate::helpers::truncate(
        &s,
        length,
        Some(&omission),
    )))
}

/// Tera filter: reformat an RFC 3339 date with a strftime pattern.
/// `LL` is accepted as shorthand for "May 30, 2023".
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };
    let format = if format == "LL" {
        "%B %d, %Y".to_string()
    } else {
        format
    };

    let date = DateTime::parse_from_rfc3339(&s)
        .map_err(|e| tera::Error::msg(format!("date_format: cannot parse {:?}: {}", s, e)))?;

    let items: Vec<Item> = StrftimeItems::new(&format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(tera::Error::msg(format!(
            "date_format: invalid format {:?}",
            format
        )));
    }

    Ok(tera::Value::String(
        date.format_with_items(items.into_iter()).to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_has_default() {
        let layouts = Layouts::builtin().unwrap();
        assert!(layouts.contains("default"));
        assert!(!layouts.contains("nonexistent"));
        assert_eq!(layouts.names(), vec!["default"]);
    }

    #[test]
    fn test_load_user_layouts() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::write(
            dir.path().join("partials/footer.html"),
            "<footer>{{ site.title }}</footer>",
        )
        .unwrap();
        fs::write(
            dir.path().join("post.html"),
            r#"<main>{{ page.content }}</main>{% include "partials/footer.html" %}"#,
        )
        .unwrap();

        let layouts = Layouts::load(dir.path()).unwrap();
        assert!(layouts.contains("post"));
        assert!(layouts.contains("default"));

        let mut context = Context::new();
        context.insert("page", &serde_json::json!({ "content": "<p>hi</p>" }));
        context.insert("site", &serde_json::json!({ "title": "Blog" }));
        let html = layouts.render("post", &context).unwrap();
        assert_eq!(html, "<main><p>hi</p></main><footer>Blog</footer>");
    }

    #[test]
    fn test_user_default_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("default.html"), "custom {{ page.title }}").unwrap();
        let layouts = Layouts::load(dir.path()).unwrap();

        let mut context = Context::new();
        context.insert("page", &serde_json::json!({ "title": "T" }));
        assert_eq!(layouts.render("default", &context).unwrap(), "custom T");
    }

    #[test]
    fn test_missing_dir_gives_builtin_only() {
        let dir = TempDir::new().unwrap();
        let layouts = Layouts::load(dir.path().join("_layouts")).unwrap();
        assert_eq!(layouts.names(), vec!["default"]);
    }

    #[test]
    fn test_broken_template_is_layouts_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();
        let err = Layouts::load(dir.path()).err().unwrap();
        assert!(matches!(err, BuildError::Layouts { .. }));
    }

    #[test]
    fn test_filters() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("filters.html"),
            r#"{{ html | strip_html }}|{{ text | truncate_chars(length=8) }}|{{ date | date_format(format="LL") }}"#,
        )
        .unwrap();
        let layouts = Layouts::load(dir.path()).unwrap();

        let mut context = Context::new();
        context.insert("html", "<b>bold</b>");
        context.insert("text", "Hello World");
        context.insert("date", "2023-05-30T00:00:00+00:00");
        assert_eq!(
            layouts.render("filters", &context).unwrap(),
            "bold|Hello...|May 30, 2023"
        );
    }
}

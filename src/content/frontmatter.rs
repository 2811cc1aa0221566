//! Front-matter parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::FrontMatterError;

/// Front-matter block delimiter
const DELIMITER: &str = "---";

/// Metadata from the YAML block at the top of a document.
///
/// Documents across a content tree carry heterogeneous keys, so this is an
/// open map in source order rather than a fixed struct. Typed accessors cover
/// the fields the pipeline itself understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, Value>,
}

impl FrontMatter {
    /// Split raw text into front matter and body.
    ///
    /// Text whose first line is not `---` has no front matter and is returned
    /// whole as the body.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let (first, rest) = split_line(content);
        if !is_delimiter(first) {
            return Ok((FrontMatter::default(), content));
        }

        let mut yaml_len = 0;
        let mut remaining = rest;
        while !remaining.is_empty() {
            let (line, next) = split_line(remaining);
            if is_delimiter(line) {
                let front_matter = Self::from_yaml(&rest[..yaml_len])?;
                let body = next.trim_start_matches(['\n', '\r']);
                return Ok((front_matter, body));
            }
            yaml_len += remaining.len() - next.len();
            remaining = next;
        }

        Err(FrontMatterError::MissingClosingDelimiter)
    }

    /// Parse the YAML between the delimiters
    pub fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        let value: Value = serde_yaml::from_str(yaml).map_err(FrontMatterError::InvalidYaml)?;
        let mapping = match value {
            Value::Null => return Ok(FrontMatter::default()),
            Value::Mapping(mapping) => mapping,
            other => return Err(FrontMatterError::NotAMapping(value_kind(&other))),
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(FrontMatterError::NotAMapping(value_kind(&other))),
            };
            fields.insert(key, value);
        }

        Ok(Self { fields })
    }

    /// Serialize the fields as YAML (without delimiters)
    pub fn to_yaml(&self) -> Result<String, FrontMatterError> {
        if self.fields.is_empty() {
            return Ok(String::new());
        }
        serde_yaml::to_string(&self.fields).map_err(FrontMatterError::Serialize)
    }

    /// Serialize as a complete `---` delimited block
    pub fn to_block(&self) -> Result<String, FrontMatterError> {
        Ok(format!("{DELIMITER}\n{}{DELIMITER}\n", self.to_yaml()?))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a key, descending into nested mappings for dotted keys
    /// (`comments.enabled`). A literal dotted key takes precedence.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// A scalar field as a string
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get_path(key).and_then(scalar_to_string)
    }

    /// A field that may be a single string or a list of strings
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.get_path(key) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn title(&self) -> Option<String> {
        self.non_blank("title")
    }

    pub fn url(&self) -> Option<String> {
        self.non_blank("url")
    }

    pub fn layout(&self) -> Option<String> {
        self.non_blank("layout")
    }

    pub fn excerpt(&self) -> Option<String> {
        self.non_blank("excerpt")
    }

    pub fn image(&self) -> Option<String> {
        self.non_blank("image")
    }

    pub fn authors(&self) -> Vec<String> {
        self.get_list("authors")
    }

    pub fn categories(&self) -> Vec<String> {
        self.get_list("categories")
    }

    /// Comments are on unless `comments.enabled` (or `comments`) is false
    pub fn comments_enabled(&self) -> bool {
        match self.get_path("comments.enabled").or_else(|| self.get("comments")) {
            Some(Value::Bool(enabled)) => *enabled,
            _ => true,
        }
    }

    /// Publication date, with naive values interpreted in `tz`
    pub fn date(&self, tz: Tz) -> Option<DateTime<FixedOffset>> {
        self.get_str("date").and_then(|s| parse_date_string(&s, tz))
    }

    /// Last modification date
    pub fn modified(&self, tz: Tz) -> Option<DateTime<FixedOffset>> {
        self.get_str("modified").and_then(|s| parse_date_string(&s, tz))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    fn non_blank(&self, key: &str) -> Option<String> {
        self.get_str(key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let with_offset = [
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M %z",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ];
    for fmt in with_offset {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    let naive_datetime = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive_datetime {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(dt, tz);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return localize(d.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "Testing with Spring Boot and @SpringBootTest"
date: 2019-06-02 05:00:00 +1100
authors: [tom]
categories:
  - Spring Boot
  - Testing
url: spring-boot-test
---

This is the content.
"#;

        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(
            fm.title().as_deref(),
            Some("Testing with Spring Boot and @SpringBootTest")
        );
        assert_eq!(fm.authors(), vec!["tom"]);
        assert_eq!(fm.categories(), vec!["Spring Boot", "Testing"]);
        assert_eq!(fm.url().as_deref(), Some("spring-boot-test"));
        assert_eq!(body, "This is the content.\n");
    }

    #[test]
    fn test_no_frontmatter_is_empty_map() {
        let content = "# Just Markdown\n\nNo metadata here.\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let content = "---\ntitle: Broken\nurl: broken\n\nBody without a closing line.\n";
        let err = FrontMatter::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingClosingDelimiter));
    }

    #[test]
    fn test_lone_delimiter_is_malformed() {
        assert!(matches!(
            FrontMatter::parse("---"),
            Err(FrontMatterError::MissingClosingDelimiter)
        ));
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = FrontMatter::parse("---\n---\nBody\n").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "Body\n");
    }

    #[test]
    fn test_crlf_and_bom() {
        let content = "\u{feff}---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title().as_deref(), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_scalar_yaml_is_not_a_mapping() {
        let err = FrontMatter::parse("---\njust a sentence\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotAMapping("a string")));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidYaml(_)));
    }

    #[test]
    fn test_horizontal_rule_later_in_body_is_untouched() {
        let content = "---\ntitle: Rules\n---\nAbove\n\n---\n\nBelow\n";
        let (fm, body) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title().as_deref(), Some("Rules"));
        assert!(body.contains("Above\n\n---\n\nBelow"));
    }

    #[test]
    fn test_round_trip_preserves_map() {
        let content = r#"---
title: Round Trip
date: 2021-03-01
authors:
  - tom
  - petros
comments:
  enabled: false
widgets: 3
2020: numeric key
---
Body
"#;
        let (fm, _) = FrontMatter::parse(content).unwrap();
        let block = fm.to_block().unwrap();
        let (reparsed, body) = FrontMatter::parse(&block).unwrap();
        assert_eq!(fm, reparsed);
        assert_eq!(body, "");
        let keys: Vec<_> = reparsed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["title", "date", "authors", "comments", "widgets", "2020"]
        );
    }

    #[test]
    fn test_comments_enabled_dotted_lookup() {
        let (fm, _) = FrontMatter::parse("---\ncomments:\n  enabled: false\n---\n").unwrap();
        assert!(!fm.comments_enabled());
        assert_eq!(fm.get_str("comments.enabled").as_deref(), Some("false"));

        let (fm, _) = FrontMatter::parse("---\ntitle: x\n---\n").unwrap();
        assert!(fm.comments_enabled());
    }

    #[test]
    fn test_single_string_list_fields() {
        let (fm, _) = FrontMatter::parse("---\nauthors: petros\ncategories: AWS\n---\n").unwrap();
        assert_eq!(fm.authors(), vec!["petros"]);
        assert_eq!(fm.categories(), vec!["AWS"]);
    }

    #[test]
    fn test_blank_title_is_missing() {
        let (fm, _) = FrontMatter::parse("---\ntitle: \"  \"\n---\n").unwrap();
        assert_eq!(fm.title(), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let utc = Tz::UTC;
        let dt = parse_date_string("2019-06-02 05:00:00 +1100", utc).unwrap();
        assert_eq!(dt.to_rfc3339(), "2019-06-02T05:00:00+11:00");

        let dt = parse_date_string("2024-01-15", utc).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let dt = parse_date_string("2024/01/15 10:30", utc).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-15 10:30");

        assert!(parse_date_string("yesterday", utc).is_none());
    }

    #[test]
    fn test_naive_date_uses_timezone() {
        let dt = parse_date_string("2024-07-01 12:00:00", Tz::Europe__Berlin).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-07-01T12:00:00+02:00");
    }
}

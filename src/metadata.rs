//! Front-matter typing and post validation.
//!
//! YAML values are narrowed to [`FieldValue`] so every field can be checked
//! exhaustively; [`validate`] then turns a [`RawDocument`] into a [`Post`] or
//! reports every problem it found in one go.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Serialize, Serializer};
use serde_yaml::Value;

use crate::config::{SiteConfig, ALWAYS_REQUIRED};
use crate::error::{DocumentError, FieldIssue, Problem};
use crate::loader::RawDocument;

/// Field name used for problems with the block as a whole.
pub const FRONT_MATTER: &str = "front matter";

/// A timestamp plus the text it was written as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub value: DateTime<FixedOffset>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Timestamp(Timestamp),
    List(Vec<String>),
}

impl FieldValue {
    /// Scalar text; timestamps give back the text they were parsed from.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Timestamp(ts) => Some(&ts.raw),
            FieldValue::List(_) => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Timestamp(ts) => serializer.serialize_str(&ts.value.to_rfc3339()),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Parses a front-matter date. Naive forms are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_field_value(value: &Value) -> Result<Option<FieldValue>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(match parse_timestamp(s) {
            Some(value) => FieldValue::Timestamp(Timestamp {
                value,
                raw: s.clone(),
            }),
            None => FieldValue::Text(s.clone()),
        })),
        Value::Number(_) | Value::Bool(_) => Ok(scalar_text(value).map(FieldValue::Text)),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_text(item).ok_or("a list of plain values"))
            .collect::<Result<Vec<_>, _>>()
            .map(|items| Some(FieldValue::List(items))),
        Value::Mapping(_) | Value::Tagged(_) => Err("a plain value or a list"),
    }
}

/// The typed front-matter block of one document.
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    fields: BTreeMap<String, FieldValue>,
    /// Keys whose values could not be narrowed to a [`FieldValue`].
    issues: Vec<FieldIssue>,
}

impl FrontMatter {
    pub fn parse(text: &str) -> Result<Self, FieldIssue> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| FieldIssue::new(FRONT_MATTER, Problem::Syntax(e.to_string())))?;
        let Value::Mapping(mapping) = value else {
            return Err(FieldIssue::new(
                FRONT_MATTER,
                Problem::Syntax("expected `key: value` pairs".to_string()),
            ));
        };

        let mut front_matter = Self::default();
        for (key, value) in mapping.iter() {
            let Some(key) = scalar_text(key) else {
                front_matter.issues.push(FieldIssue::new(
                    FRONT_MATTER,
                    Problem::Syntax("keys must be plain values".to_string()),
                ));
                continue;
            };
            match to_field_value(value) {
                Ok(Some(v)) => {
                    front_matter.fields.insert(key, v);
                }
                Ok(None) => {}
                Err(expected) => front_matter
                    .issues
                    .push(FieldIssue::new(key, Problem::WrongType { expected })),
            }
        }
        Ok(front_matter)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    fn has_issue(&self, key: &str) -> bool {
        self.issues.iter().any(|i| i.field == key)
    }
}

/// A post whose front matter passed validation.
#[derive(Debug, Clone)]
pub struct Post {
    pub source: PathBuf,
    pub slug: String,
    pub extension: String,
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub author: Option<String>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub layout: Option<String>,
    pub published: bool,
    /// Raw (unrendered) excerpt.
    pub excerpt: String,
    pub body: String,
    /// Every front-matter key not listed above.
    pub extra: BTreeMap<String, FieldValue>,
}

const KNOWN_FIELDS: [&str; 8] = [
    "title",
    "date",
    "author",
    "categories",
    "tags",
    "layout",
    "published",
    "excerpt",
];

/// Collects typed values and the problems found along the way.
struct Checker<'a> {
    front_matter: &'a FrontMatter,
    issues: Vec<FieldIssue>,
}

impl Checker<'_> {
    fn text(&mut self, key: &str) -> Option<String> {
        match self.front_matter.get(key)? {
            FieldValue::List(_) => {
                self.issues.push(FieldIssue::new(
                    key,
                    Problem::WrongType {
                        expected: "a single value",
                    },
                ));
                None
            }
            value => value.as_text().map(str::to_string),
        }
    }

    fn timestamp(&mut self, key: &str) -> Option<DateTime<FixedOffset>> {
        match self.front_matter.get(key)? {
            FieldValue::Timestamp(ts) => Some(ts.value),
            FieldValue::Text(raw) => {
                self.issues
                    .push(FieldIssue::new(key, Problem::InvalidDate(raw.clone())));
                None
            }
            FieldValue::List(_) => {
                self.issues
                    .push(FieldIssue::new(key, Problem::WrongType { expected: "a date" }));
                None
            }
        }
    }

    /// A list, or a single value split on commas and whitespace.
    fn set(&mut self, key: &str) -> BTreeSet<String> {
        let items: Vec<String> = match self.front_matter.get(key) {
            None => return BTreeSet::new(),
            Some(FieldValue::List(items)) => items.clone(),
            Some(value) => value
                .as_text()
                .unwrap_or_default()
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(str::to_string)
                .collect(),
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn flag(&mut self, key: &str) -> Option<bool> {
        let text = self.text(key)?;
        match text.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                self.issues.push(FieldIssue::new(
                    key,
                    Problem::InvalidValue(format!("expected true or false, found {other:?}")),
                ));
                None
            }
        }
    }
}

fn excerpt_of(body: &str, separator: &str) -> String {
    let body = body.trim_start();
    let excerpt = if separator.is_empty() {
        body
    } else {
        body.split(separator).next().unwrap_or(body)
    };
    excerpt.trim_end().to_string()
}

/// Checks a loaded document against the site's required fields and the
/// known field types. Every problem is reported, each field at most once.
pub fn validate(raw: RawDocument, config: &SiteConfig) -> Result<Post, DocumentError> {
    let front_matter = match raw.front_matter.as_deref() {
        Some(text) => FrontMatter::parse(text).map_err(|issue| DocumentError::Validation {
            path: raw.path.clone(),
            issues: vec![issue],
        })?,
        None => FrontMatter::default(),
    };

    let mut checker = Checker {
        front_matter: &front_matter,
        issues: front_matter.issues().to_vec(),
    };

    let required: BTreeSet<&str> = config
        .required_fields
        .iter()
        .map(String::as_str)
        .chain(ALWAYS_REQUIRED)
        .collect();
    for field in required {
        if front_matter.get(field).is_none() && !front_matter.has_issue(field) {
            checker.issues.push(FieldIssue::new(field, Problem::Missing));
        }
    }

    let title = checker.text("title");
    let date = checker.timestamp("date");
    let author = checker.text("author").or_else(|| config.author.clone());
    let categories = checker.set("categories");
    let tags = checker.set("tags");
    let layout = checker.text("layout");
    let published = checker.flag("published").unwrap_or(true);
    let excerpt = checker
        .text("excerpt")
        .unwrap_or_else(|| excerpt_of(&raw.body, &config.excerpt_separator));

    let mut issues = checker.issues;
    issues.sort_by(|a, b| a.field.cmp(&b.field));

    match (title, date) {
        (Some(title), Some(date)) if issues.is_empty() => {
            let extra = front_matter
                .fields
                .iter()
                .filter(|(k, _)| !KNOWN_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Post {
                source: raw.path,
                slug: raw.slug,
                extension: raw.extension,
                title,
                date,
                author,
                categories,
                tags,
                layout,
                published,
                excerpt,
                body: raw.body,
                extra,
            })
        }
        _ => Err(DocumentError::Validation {
            path: raw.path,
            issues,
        }),
    }
}

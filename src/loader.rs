//! Content discovery: finds `YYYY-MM-DD-title.ext` files below the content
//! directory and splits each into front matter and body.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use slug::slugify;
use walkdir::{DirEntry, WalkDir};

use crate::error::DocumentError;

/// A content file as read from disk, before its front matter is checked.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub path: PathBuf,
    /// Date encoded in the file name.
    pub file_date: NaiveDate,
    pub slug: String,
    /// Lower-cased extension, without the dot.
    pub extension: String,
    /// Text between the `---` delimiters, `None` when the file has no block.
    pub front_matter: Option<String>,
    pub body: String,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)\.([A-Za-z0-9]+)$").unwrap()
    })
}

/// Parts of a post file name that follows the `YYYY-MM-DD-title.ext` convention.
#[derive(Debug, PartialEq, Eq)]
pub struct PostName<'a> {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub title: &'a str,
    pub extension: &'a str,
}

pub fn parse_post_name(file_name: &str) -> Option<PostName<'_>> {
    let caps = name_pattern().captures(file_name)?;
    Some(PostName {
        year: caps.get(1)?.as_str().parse().ok()?,
        month: caps.get(2)?.as_str().parse().ok()?,
        day: caps.get(3)?.as_str().parse().ok()?,
        title: caps.get(4)?.as_str(),
        extension: caps.get(5)?.as_str(),
    })
}

fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

/// Splits a leading `---` block from the body.
///
/// Returns `Ok((None, text))` when the text does not open with `---`, and an
/// error message when the block is never closed by `---` or `...`.
pub fn split_front_matter(text: &str) -> Result<(Option<&str>, &str), &'static str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (first, mut rest) = split_line(text);
    if first.trim_end_matches('\r') != "---" {
        return Ok((None, text));
    }

    let start = text.len() - rest.len();
    let mut end = start;
    while !rest.is_empty() {
        let (line, next) = split_line(rest);
        if matches!(line.trim_end_matches('\r'), "---" | "...") {
            return Ok((Some(&text[start..end]), next));
        }
        end += rest.len() - next.len();
        rest = next;
    }
    Err("front matter opened with `---` is never closed")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(false, |s| s.starts_with('.') || s.starts_with('_'))
}

/// Walks the content directory. Every call to [`ContentLoader::documents`]
/// rescans from scratch in file-name order.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    root: PathBuf,
    extensions: Vec<String>,
}

impl ContentLoader {
    /// `extensions` are expected lower-cased and without a dot, as
    /// [`SiteConfig`](crate::config::SiteConfig) keeps them.
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.to_vec(),
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = Result<RawDocument, DocumentError>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_file() => self.load(entry.path()),
                Ok(_) => None,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    Some(Err(DocumentError::Io {
                        path,
                        source: err.into(),
                    }))
                }
            })
    }

    /// `None` when the file is not a post (wrong name or extension).
    pub fn load(&self, path: &Path) -> Option<Result<RawDocument, DocumentError>> {
        let file_name = path.file_name()?.to_str()?;
        let Some(name) = parse_post_name(file_name) else {
            debug!("skipping {path:?}: not named YYYY-MM-DD-title.ext");
            return None;
        };
        let extension = name.extension.to_ascii_lowercase();
        if !self.extensions.contains(&extension) {
            debug!("skipping {path:?}: extension {extension:?} is not a content type");
            return None;
        }
        Some(read_document(path, &name, extension))
    }
}

fn read_document(
    path: &Path,
    name: &PostName<'_>,
    extension: String,
) -> Result<RawDocument, DocumentError> {
    let malformed = |reason: String| DocumentError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let file_date = NaiveDate::from_ymd_opt(name.year, name.month, name.day).ok_or_else(|| {
        malformed(format!(
            "{:04}-{:02}-{:02} in the file name is not a calendar date",
            name.year, name.month, name.day
        ))
    })?;
    let slug = slugify(name.title);
    if slug.is_empty() {
        return Err(malformed(format!(
            "file name title {:?} has no letters or digits",
            name.title
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let (front_matter, body) =
        split_front_matter(&content).map_err(|reason| malformed(reason.to_string()))?;

    debug!("loaded {path:?} as {slug:?}");
    Ok(RawDocument {
        path: path.to_path_buf(),
        file_date,
        slug,
        extension,
        front_matter: front_matter.map(str::to_string),
        body: body.to_string(),
    })
}

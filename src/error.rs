use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single content document. The build keeps going past these and
/// reports them together at the end.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("{}: malformed document: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("{}: invalid front matter: {}", .path.display(), join_issues(.issues))]
    Validation {
        path: PathBuf,
        issues: Vec<FieldIssue>,
    },
    #[error("{}: {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: handlebars::RenderError,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One problem with one front-matter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    WrongType { expected: &'static str },
    InvalidDate(String),
    InvalidValue(String),
    Syntax(String),
}

impl FieldIssue {
    pub(crate) fn new(field: impl Into<String>, problem: Problem) -> Self {
        Self {
            field: field.into(),
            problem,
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "`{}` is missing", self.field),
            Problem::WrongType { expected } => {
                write!(f, "`{}` must be {}", self.field, expected)
            }
            Problem::InvalidDate(raw) => {
                write!(f, "`{}`: {:?} is not a valid date", self.field, raw)
            }
            Problem::InvalidValue(msg) => write!(f, "`{}`: {}", self.field, msg),
            Problem::Syntax(msg) => write!(f, "{}: {}", self.field, msg),
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that stop a build (or mark it failed).
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("content directory {} does not exist or is not a directory", .0.display())]
    MissingContentDir(PathBuf),
    #[error(
        "{} and {} would both be written to {}",
        .first.display(),
        .second.display(),
        .output.display()
    )]
    SlugCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("{} document(s) failed", .failures.len())]
    Documents { failures: Vec<DocumentError> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_issue() {
        let err = DocumentError::Validation {
            path: PathBuf::from("_posts/2025-07-20-a.md"),
            issues: vec![
                FieldIssue::new("title", Problem::Missing),
                FieldIssue::new("date", Problem::InvalidDate("not-a-date".into())),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("_posts/2025-07-20-a.md: invalid front matter:"));
        assert!(msg.contains("`title` is missing"));
        assert!(msg.contains("\"not-a-date\" is not a valid date"));
    }

    #[test]
    fn collision_names_both_sources() {
        let err = BuildError::SlugCollision {
            output: PathBuf::from("hello.html"),
            first: PathBuf::from("a/2025-01-01-hello.md"),
            second: PathBuf::from("b/2025-01-02-hello.md"),
        };
        let msg = err.to_string();
        assert!(msg.contains("a/2025-01-01-hello.md"));
        assert!(msg.contains("b/2025-01-02-hello.md"));
        assert!(msg.contains("hello.html"));
    }
}

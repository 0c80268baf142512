//! # blogkit
//!
//! Builds a blog from a directory of dated Markdown posts:
//!
//! ```text
//! _posts/2025-07-20-hello-world.md   --->   _site/hello-world.html
//! _posts/2025-07-25-release-notes.md        _site/release-notes.html
//!                                           _site/index.html
//!                                           _site/tags/<tag>.html
//!                                           _site/categories/<category>.html
//!                                           _site/feed.xml
//! ```
//!
//! The pipeline runs in one pass:
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | finds `YYYY-MM-DD-title.ext` files, splits front matter from body |
//! | [`metadata`] | types the front matter, validates required fields |
//! | [`collection`] | orders posts (newest first) and rejects output path collisions |
//! | [`renderer`] | handlebars templates and Markdown |
//! | [`feed`] | Atom feed |
//! | [`generator`] | drives the above and writes the output directory |
//! | [`config`] | `_config.yml` |
//!
//! Per-document problems (bad delimiters, missing or malformed fields) do not
//! stop a build: every valid post is still written and the failures are
//! reported together. Two posts claiming the same output path stop the build
//! before anything is written.

pub mod collection;
pub mod config;
pub mod error;
pub mod feed;
pub mod generator;
pub mod loader;
pub mod metadata;
pub mod renderer;

#[cfg(test)]
pub(crate) mod test_helpers;

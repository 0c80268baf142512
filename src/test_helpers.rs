//! Shared test utilities: in-memory posts and on-disk content trees.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, TimeZone};
use tempfile::TempDir;

use crate::config::SiteConfig;
use crate::metadata::Post;

/// A valid post dated `date` (`YYYY-MM-DD`, midnight UTC).
pub fn post(date: &str, slug: &str) -> Post {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    let utc = FixedOffset::east_opt(0).unwrap();
    Post {
        source: PathBuf::from(format!("_posts/{date}-{slug}.md")),
        slug: slug.to_string(),
        extension: "md".to_string(),
        title: format!("Title of {slug}"),
        date: utc
            .from_local_datetime(&day.and_hms_opt(0, 0, 0).unwrap())
            .unwrap(),
        author: None,
        categories: BTreeSet::new(),
        tags: BTreeSet::new(),
        layout: None,
        published: true,
        excerpt: format!("About {slug}."),
        body: format!("About {slug}.\n\nMore *text*."),
        extra: BTreeMap::new(),
    }
}

/// A site rooted in a fresh temp dir, with paths in `config` pointing inside it.
pub struct Site {
    pub dir: TempDir,
    pub config: SiteConfig,
}

impl Site {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig {
            content_dir: dir.path().join("_posts"),
            output_dir: dir.path().join("_site"),
            static_dir: dir.path().join("static"),
            template_dir: dir.path().join("_layouts"),
            ..SiteConfig::default()
        };
        std::fs::create_dir_all(&config.content_dir).unwrap();
        Self { dir, config }
    }

    pub fn write_post(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config.content_dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn output(&self, relative: &str) -> PathBuf {
        self.config.output_dir.join(relative)
    }

    pub fn read_output(&self, relative: &str) -> String {
        std::fs::read_to_string(self.output(relative)).unwrap()
    }
}

/// Every file below `root` with its content, keyed by relative path.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            (
                e.path().strip_prefix(root).unwrap().to_path_buf(),
                std::fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

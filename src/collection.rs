//! The ordered set of posts that make up the site.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;

use log::debug;
use slug::slugify;

use crate::config::Permalink;
use crate::error::BuildError;
use crate::feed::FEED_PATH;
use crate::metadata::Post;

pub const INDEX_PATH: &str = "index.html";

/// Root-level outputs the generator writes besides post pages. Tag and
/// category pages live under `tags/` and `categories/`, which no permalink
/// style can produce.
pub const GENERATED_OUTPUTS: [&str; 2] = [INDEX_PATH, FEED_PATH];

/// A post together with the path it is written to, relative to the output
/// directory.
#[derive(Debug, Clone)]
pub struct Entry {
    pub post: Post,
    pub output: PathBuf,
}

impl Entry {
    /// Root-relative URL path, always with `/` separators.
    pub fn url_path(&self) -> String {
        let parts: Vec<_> = self
            .output
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        parts.join("/")
    }
}

pub fn output_path(post: &Post, permalink: Permalink) -> PathBuf {
    let file = format!("{}.html", post.slug);
    match permalink {
        Permalink::Flat => PathBuf::from(file),
        Permalink::Dated => PathBuf::from(post.date.format("%Y/%m/%d").to_string()).join(file),
    }
}

/// Date descending, then slug ascending. The source path only breaks ties
/// between posts that are about to collide anyway.
pub fn sort_posts(a: &Post, b: &Post) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.slug.cmp(&b.slug))
        .then_with(|| a.source.cmp(&b.source))
}

/// Posts sharing one tag or category.
#[derive(Debug)]
pub struct Group<'a> {
    /// Name as first written in collection order.
    pub name: &'a str,
    /// Indexes into [`Collection::entries`], in collection order.
    pub members: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl Collection {
    /// Orders `posts` and checks that no two of them share an output path,
    /// and that none of them lands on one of [`GENERATED_OUTPUTS`].
    pub fn new(posts: Vec<Post>, permalink: Permalink) -> Result<Self, BuildError> {
        let mut posts = posts;
        posts.sort_by(sort_posts);

        let mut claimed: BTreeMap<PathBuf, PathBuf> = GENERATED_OUTPUTS
            .iter()
            .map(|&path| (PathBuf::from(path), PathBuf::from(format!("generated {path}"))))
            .collect();
        let mut entries = Vec::with_capacity(posts.len());
        for post in posts {
            let output = output_path(&post, permalink);
            if let Some(first) = claimed.get(&output) {
                return Err(BuildError::SlugCollision {
                    output,
                    first: first.clone(),
                    second: post.source,
                });
            }
            claimed.insert(output.clone(), post.source.clone());
            entries.push(Entry { post, output });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Drops entries, keeping the order of the rest.
    pub fn retain(&mut self, keep: impl FnMut(&Entry) -> bool) {
        self.entries.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag pages keyed by slug, so `Rust` and `rust` share a page.
    pub fn tags(&self) -> BTreeMap<String, Group<'_>> {
        self.group_by(|post| post.tags.iter())
    }

    pub fn categories(&self) -> BTreeMap<String, Group<'_>> {
        self.group_by(|post| post.categories.iter())
    }

    fn group_by<'a, F, I>(&'a self, keys: F) -> BTreeMap<String, Group<'a>>
    where
        F: Fn(&'a Post) -> I,
        I: Iterator<Item = &'a String>,
    {
        let mut groups: BTreeMap<String, Group<'a>> = BTreeMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            for name in keys(&entry.post) {
                let key = slugify(name);
                if key.is_empty() {
                    continue;
                }
                let group = groups.entry(key).or_insert_with(|| Group {
                    name,
                    members: vec![],
                });
                if group.name != name.as_str() {
                    debug!("{name:?} shares a page with {:?}", group.name);
                }
                // a post listing both `Rust` and `rust` appears once
                if group.members.last() != Some(&index) {
                    group.members.push(index);
                }
            }
        }
        groups
    }
}

use std::collections::BTreeMap;

use serde::Serialize;
use slug::slugify;

use crate::collection::Entry;
use crate::config::SiteConfig;
use crate::metadata::FieldValue;
use crate::renderer::render_content;

#[derive(Serialize, Debug)]
pub(super) struct SiteData<'a> {
    pub title: &'a str,
    pub url: Option<&'a str>,
    pub description: Option<&'a str>,
    pub author: Option<&'a str>,
    pub extra: &'a BTreeMap<String, serde_yaml::Value>,
}

impl<'a> SiteData<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self {
            title: &config.site_title,
            url: config.site_url.as_deref(),
            description: config.description.as_deref(),
            author: config.author.as_deref(),
            extra: &config.extra,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub(super) struct TermRef<'a> {
    pub name: &'a str,
    pub slug: String,
}

fn terms<'a>(names: impl Iterator<Item = &'a String>) -> Vec<TermRef<'a>> {
    names
        .map(|name| TermRef {
            name,
            slug: slugify(name),
        })
        .filter(|t| !t.slug.is_empty())
        .collect()
}

/// What templates see of a post in listings and on its own page.
#[derive(Serialize, Debug, Clone)]
pub(super) struct PostSummary<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub url: String,
    pub date: String,
    pub author: Option<&'a str>,
    pub categories: Vec<TermRef<'a>>,
    pub tags: Vec<TermRef<'a>>,
    /// Rendered HTML.
    pub excerpt: String,
    pub extra: &'a BTreeMap<String, FieldValue>,
}

impl<'a> PostSummary<'a> {
    pub fn new(entry: &'a Entry) -> Self {
        let post = &entry.post;
        Self {
            title: &post.title,
            slug: &post.slug,
            url: entry.url_path(),
            date: post.date.to_rfc3339(),
            author: post.author.as_deref(),
            categories: terms(post.categories.iter()),
            tags: terms(post.tags.iter()),
            excerpt: render_content(post, &post.excerpt),
            extra: &post.extra,
        }
    }
}

#[derive(Serialize, Debug)]
pub(super) struct PostPageData<'a> {
    pub site: &'a SiteData<'a>,
    pub path: String,
    pub post: &'a PostSummary<'a>,
    /// Rendered body.
    pub content: String,
    pub newer: Option<&'a PostSummary<'a>>,
    pub older: Option<&'a PostSummary<'a>>,
}

#[derive(Serialize, Debug)]
pub(super) struct ListPageData<'a> {
    pub site: &'a SiteData<'a>,
    pub title: String,
    pub path: String,
    pub posts: Vec<&'a PostSummary<'a>>,
}

//! The build pipeline: load, validate, collect, render, write.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use handlebars::RenderError;
use log::{debug, info, warn};

use crate::collection::{Collection, INDEX_PATH};
use crate::config::SiteConfig;
use crate::error::{BuildError, DocumentError};
use crate::feed::{render_feed, FEED_PATH};
use crate::loader::ContentLoader;
use crate::metadata::{validate, Post};
use crate::renderer::{render_content, Renderer};

mod data;
mod utils;

use data::{ListPageData, PostPageData, PostSummary, SiteData};

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Remove the output directory before writing.
    pub clean: bool,
    /// Keep posts marked `published: false`.
    pub include_unpublished: bool,
}

/// Posts that made it through loading and validation, plus the documents
/// that did not.
#[derive(Debug)]
pub struct Loaded {
    pub collection: Collection,
    pub failures: Vec<DocumentError>,
    pub unpublished: usize,
}

#[derive(Debug)]
pub struct BuildReport {
    pub posts: usize,
    /// Every file written, in write order.
    pub written: Vec<PathBuf>,
    /// Bytes copied from the static directory.
    pub static_bytes: u64,
}

/// Runs the loader and validator over every document and orders the result.
///
/// Per-document failures are collected, not returned; only an unusable
/// content directory or a slug collision fails the whole call.
pub fn load(config: &SiteConfig, include_unpublished: bool) -> Result<Loaded, BuildError> {
    if !config.content_dir.is_dir() {
        return Err(BuildError::MissingContentDir(config.content_dir.clone()));
    }

    let loader = ContentLoader::new(&config.content_dir, &config.extensions);
    let mut posts: Vec<Post> = vec![];
    let mut failures = vec![];
    let mut unpublished = 0;
    for document in loader.documents() {
        match document.and_then(|raw| validate(raw, config)) {
            Ok(post) if !post.published && !include_unpublished => {
                warn!("skipping unpublished {:?}", post.source);
                unpublished += 1;
            }
            Ok(post) => posts.push(post),
            Err(err) => {
                debug!("{err}");
                failures.push(err);
            }
        }
    }

    let collection = Collection::new(posts, config.permalink)?;
    Ok(Loaded {
        collection,
        failures,
        unpublished,
    })
}

/// A rendered output file, relative to the output directory.
struct Page {
    path: PathBuf,
    content: String,
}

/// Renders one page per post, returning the sources whose template failed
/// alongside the pages that did render.
fn render_posts(
    site: &SiteData<'_>,
    renderer: &Renderer,
    collection: &Collection,
) -> (Vec<Page>, Vec<(PathBuf, RenderError)>) {
    let summaries: Vec<PostSummary> = collection.entries().iter().map(PostSummary::new).collect();
    let mut pages = vec![];
    let mut failed = vec![];

    for (i, entry) in collection.entries().iter().enumerate() {
        let template = entry.post.layout.as_deref().unwrap_or("post");
        let (newer, older) = (i.checked_sub(1), i + 1);
        let data = PostPageData {
            site,
            path: format!("/{}", summaries[i].url),
            post: &summaries[i],
            content: render_content(&entry.post, &entry.post.body),
            newer: newer.and_then(|n| summaries.get(n)),
            older: summaries.get(older),
        };
        match renderer.render(template, &data) {
            Ok(content) => pages.push(Page {
                path: entry.output.clone(),
                content,
            }),
            Err(source) => failed.push((entry.post.source.clone(), source)),
        }
    }
    (pages, failed)
}

/// Renders every page of the site. Posts whose template fails are moved from
/// `collection` to `failures` first, so no listing, pager link or feed entry
/// points at a page that is never written.
fn render_pages(
    config: &SiteConfig,
    renderer: &Renderer,
    collection: &mut Collection,
    failures: &mut Vec<DocumentError>,
) -> anyhow::Result<Vec<Page>> {
    let site = SiteData::new(config);

    // pager links must skip dropped posts
    let mut pages = loop {
        let (pages, failed) = render_posts(&site, renderer, collection);
        if failed.is_empty() {
            break pages;
        }
        let dropped: BTreeSet<PathBuf> = failed.iter().map(|(path, _)| path.clone()).collect();
        collection.retain(|entry| !dropped.contains(&entry.post.source));
        failures.extend(
            failed
                .into_iter()
                .map(|(path, source)| DocumentError::Render { path, source }),
        );
    };
    let summaries: Vec<PostSummary> = collection.entries().iter().map(PostSummary::new).collect();

    // index page
    let index = ListPageData {
        site: &site,
        title: String::new(),
        path: "/".to_string(),
        posts: summaries.iter().collect(),
    };
    pages.push(Page {
        path: PathBuf::from(INDEX_PATH),
        content: renderer
            .render("index", &index)
            .context("while generating index.html")?,
    });

    // tag and category pages
    let groups = [
        ("tags", "Tag", collection.tags()),
        ("categories", "Category", collection.categories()),
    ];
    for (dir, label, groups) in groups {
        for (slug, group) in groups {
            let path = PathBuf::from(dir).join(format!("{slug}.html"));
            let posts = group.members.iter().filter_map(|&i| summaries.get(i)).collect();
            let data = ListPageData {
                site: &site,
                title: format!("{label}: {}", group.name),
                path: format!("/{dir}/{slug}.html"),
                posts,
            };
            let content = renderer
                .render("list", &data)
                .with_context(|| format!("while generating {path:?}"))?;
            pages.push(Page { path, content });
        }
    }

    pages.push(Page {
        path: PathBuf::from(FEED_PATH),
        content: render_feed(config, collection)?,
    });
    Ok(pages)
}

/// Builds the site into `config.output_dir`.
///
/// Every valid post is written even when other documents fail; those
/// failures come back as [`BuildError::Documents`] after writing. A slug
/// collision stops the build before anything is written.
pub fn build(config: &SiteConfig, options: BuildOptions) -> anyhow::Result<BuildReport> {
    let renderer = Renderer::new(&config.template_dir)?;
    let Loaded {
        mut collection,
        mut failures,
        unpublished,
    } = load(config, options.include_unpublished)?;
    info!(
        "loaded {} post(s) from {:?} ({} failed, {} unpublished)",
        collection.len(),
        config.content_dir,
        failures.len(),
        unpublished
    );

    let pages = render_pages(config, &renderer, &mut collection, &mut failures)?;

    let out_dir = &config.output_dir;
    if options.clean {
        utils::clean(out_dir)?;
    }
    std::fs::create_dir_all(out_dir).with_context(|| format!("while creating {out_dir:?}"))?;
    let static_bytes = utils::copy_static(&config.static_dir, out_dir)?;

    let mut written = Vec::with_capacity(pages.len());
    for page in &pages {
        written.push(utils::write_output(out_dir, &page.path, &page.content)?);
    }
    info!("wrote {} file(s) to {:?}", written.len(), out_dir);

    if !failures.is_empty() {
        warn!("{} document(s) were not built", failures.len());
        return Err(BuildError::Documents { failures }.into());
    }
    Ok(BuildReport {
        posts: collection.len(),
        written,
        static_bytes,
    })
}

/// Output path of every post in collection order, for `check`.
pub fn listing(collection: &Collection) -> Vec<(String, &Path, &str)> {
    collection
        .entries()
        .iter()
        .map(|e| {
            (
                e.post.date.format("%Y-%m-%d").to_string(),
                e.output.as_path(),
                e.post.title.as_str(),
            )
        })
        .collect()
}

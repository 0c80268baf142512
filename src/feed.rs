//! Atom feed of the newest posts.

use anyhow::Context;
use atom_syndication::{
    CategoryBuilder, ContentBuilder, EntryBuilder, FeedBuilder, FixedDateTime, LinkBuilder,
    PersonBuilder, Text,
};
use chrono::{DateTime, Utc};

use crate::collection::Collection;
use crate::config::SiteConfig;
use crate::renderer::render_content;

pub const FEED_PATH: &str = "feed.xml";

/// Builds the feed XML. `updated` is the newest post's date, so unchanged
/// content gives an identical feed.
pub fn render_feed(config: &SiteConfig, collection: &Collection) -> anyhow::Result<String> {
    let entries: Vec<_> = collection
        .entries()
        .iter()
        .take(config.feed_limit)
        .map(|entry| {
            let post = &entry.post;
            let url = config.url_for(&entry.url_path());
            let categories = post
                .categories
                .iter()
                .chain(post.tags.iter())
                .map(|term| CategoryBuilder::default().term(term.clone()).build())
                .collect::<Vec<_>>();
            let authors = post
                .author
                .iter()
                .map(|name| PersonBuilder::default().name(name.clone()).build())
                .collect::<Vec<_>>();
            let content = ContentBuilder::default()
                .value(Some(render_content(post, &post.body)))
                .content_type(Some("html".to_string()))
                .build();
            EntryBuilder::default()
                .title(post.title.clone())
                .id(url.clone())
                .updated(post.date)
                .published(Some(post.date))
                .links(vec![LinkBuilder::default().href(url).rel("alternate").build()])
                .authors(authors)
                .categories(categories)
                .content(Some(content))
                .build()
        })
        .collect();

    let updated: FixedDateTime = match collection.entries().first() {
        Some(newest) => newest.post.date,
        None => DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
    };
    let site_url = config.url_for("");
    let feed = FeedBuilder::default()
        .title(config.site_title.clone())
        .id(site_url.clone())
        .updated(updated)
        .subtitle(config.description.clone().map(Text::from))
        .authors(
            config
                .author
                .iter()
                .map(|name| PersonBuilder::default().name(name.clone()).build())
                .collect::<Vec<_>>(),
        )
        .links(vec![
            LinkBuilder::default().href(site_url).rel("alternate").build(),
            LinkBuilder::default()
                .href(config.url_for(FEED_PATH))
                .rel("self")
                .build(),
        ])
        .entries(entries)
        .build();

    let bytes = feed.write_to(Vec::new()).context("while writing feed.xml")?;
    String::from_utf8(bytes).context("feed.xml is not UTF-8")
}

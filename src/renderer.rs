use std::path::Path;

use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::DateTime;
use handlebars::{handlebars_helper, Handlebars, RenderError};
use log::debug;
use maud::html;
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;

use crate::metadata::Post;

const LAYOUT: &str = "layout";

const BUILTIN_TEMPLATES: [(&str, &str); 3] = [
    ("index", include_str!("../templates/index.hbs")),
    ("post", include_str!("../templates/post.hbs")),
    ("list", include_str!("../templates/list.hbs")),
];

fn render_breadcrumbs(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    html! {
        a href="/" { "/" }
        " "
        @for (i, part) in parts.iter().copied().enumerate() {
            @if i > 0 { " / " }
            a href=(format!("/{}", parts[..=i].join("/"))) {
                (part.strip_suffix(".html").unwrap_or(part))
            }
        }
    }
    .into_string()
}

/// Formats an RFC 3339 date with a strftime pattern. Unparseable input or an
/// invalid pattern gives back the date unchanged.
fn format_date(date: &str, pattern: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(date) else {
        return date.to_string();
    };
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return date.to_string();
    }
    parsed
        .format_with_items(StrftimeItems::new(pattern))
        .to_string()
}

handlebars_helper!(breadcrumbs: |path: str| render_breadcrumbs(path));
handlebars_helper!(date_fmt: |date: str, pattern: str| format_date(date, pattern));
handlebars_helper!(slice_until: |lst: array, upper: usize| lst[..upper.min(lst.len())].to_owned());
handlebars_helper!(slice_since: |lst: array, lower: usize| lst[lower.min(lst.len())..].to_owned());
handlebars_helper!(slice: |lst: array, lower: usize, upper: usize| {
    let upper = upper.min(lst.len());
    lst[lower.min(upper)..upper].to_owned()
});

/// Markdown with the extensions commonly used in engineering posts.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(source, options));
    out
}

/// Renders `text` according to the post's source format; HTML passes through.
pub fn render_content(post: &Post, text: &str) -> String {
    match post.extension.as_str() {
        "md" | "markdown" => render_markdown(text),
        _ => text.to_string(),
    }
}

/// Handlebars registry with the built-in templates, overridden by any
/// `<name>.hbs` found in the template directory.
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    pub fn new(template_dir: &Path) -> anyhow::Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_helper("breadcrumbs", Box::new(breadcrumbs));
        handlebars.register_helper("date_fmt", Box::new(date_fmt));
        handlebars.register_helper("slice", Box::new(slice));
        handlebars.register_helper("slice_since", Box::new(slice_since));
        handlebars.register_helper("slice_until", Box::new(slice_until));

        handlebars
            .register_partial(LAYOUT, include_str!("../templates/layout.hbs"))
            .context("built-in layout.hbs")?;
        for (name, source) in BUILTIN_TEMPLATES {
            handlebars
                .register_template_string(name, source)
                .with_context(|| format!("built-in {name}.hbs"))?;
        }

        if template_dir.is_dir() {
            let mut files: Vec<_> = std::fs::read_dir(template_dir)
                .with_context(|| format!("reading {template_dir:?}"))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "hbs"))
                .collect();
            files.sort();
            for path in files {
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                debug!("using template {path:?}");
                if name == LAYOUT {
                    handlebars.register_partial(
                        LAYOUT,
                        std::fs::read_to_string(&path).with_context(|| format!("{path:?}"))?,
                    )?;
                } else {
                    handlebars
                        .register_template_file(name, &path)
                        .with_context(|| format!("{path:?}"))?;
                }
            }
        }

        Ok(Self { handlebars })
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars.render(template, data)
    }
}

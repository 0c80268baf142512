//! Site configuration loaded from `_config.yml`.
//!
//! Every option is optional; a missing file means stock defaults. Keys this
//! crate does not know are kept in [`SiteConfig::extra`] and handed to the
//! templates as `site.extra`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields every post must carry regardless of configuration.
pub const ALWAYS_REQUIRED: [&str; 2] = ["title", "date"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("`extensions` must not be empty")]
    NoExtensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permalink {
    /// `<slug>.html`
    #[default]
    Flat,
    /// `YYYY/MM/DD/<slug>.html`
    Dated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site_title: String,
    pub site_url: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub content_dir: PathBuf,
    pub output_dir: PathBuf,
    pub static_dir: PathBuf,
    pub template_dir: PathBuf,
    pub required_fields: BTreeSet<String>,
    pub extensions: Vec<String>,
    pub permalink: Permalink,
    pub excerpt_separator: String,
    pub feed_limit: usize,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "My Blog".to_string(),
            site_url: None,
            description: None,
            author: None,
            content_dir: PathBuf::from("_posts"),
            output_dir: PathBuf::from("_site"),
            static_dir: PathBuf::from("static"),
            template_dir: PathBuf::from("_layouts"),
            required_fields: ALWAYS_REQUIRED.iter().map(|s| s.to_string()).collect(),
            extensions: vec!["md".into(), "markdown".into(), "html".into()],
            permalink: Permalink::Flat,
            excerpt_separator: "\n\n".to_string(),
            feed_limit: 20,
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        // an empty document deserializes to unit, not to a mapping
        if text.trim().is_empty() {
            return Ok(Self::default().normalized());
        }
        let config: SiteConfig = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        for key in config.extra.keys() {
            debug!("{path:?}: passing unrecognized option `{key}` to templates");
        }
        Ok(config.normalized())
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("Config file({path:?}) does not exist. using defaults...");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }

    fn normalized(mut self) -> Self {
        for field in ALWAYS_REQUIRED {
            self.required_fields.insert(field.to_string());
        }
        for ext in self.extensions.iter_mut() {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
        self
    }

    /// Absolute URL for a site-relative path, or the path itself rooted at `/`
    /// when no `site_url` is configured.
    pub fn url_for(&self, relative: &str) -> String {
        match &self.site_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), relative),
            None => format!("/{relative}"),
        }
    }
}

/// Documented stock `_config.yml`, printed by `gen-config`.
pub fn stock_config_yaml() -> &'static str {
    r#"# blogkit site configuration. Every option is optional.

site_title: "My Blog"
# site_url: "https://blog.example.com"  # absolute base URL, used by feed.xml
# description: "Notes from the engineering team"
# author: "Engineering"                 # default author for posts and the feed

content_dir: "_posts"      # posts named YYYY-MM-DD-title.ext
output_dir: "_site"        # rendered site
static_dir: "static"       # copied verbatim into output_dir when present
template_dir: "_layouts"   # layout.hbs, index.hbs, post.hbs, list.hbs overrides

# title and date are always required
required_fields: [title, date]

extensions: [md, markdown, html]

# flat:  <slug>.html
# dated: YYYY/MM/DD/<slug>.html
permalink: flat

excerpt_separator: "\n\n"
feed_limit: 20

# Any other key is available to templates as site.extra.<key>
"#
}

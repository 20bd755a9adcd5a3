//! The content-management host, seen from the generator.
//!
//! The generator never renders anything itself. It asks a [`Host`] for the
//! page tree, the configured languages and URL roots, and for the rendered
//! markup of one page in one language. Everything the host needs to know
//! about "where" a render happens is passed explicitly in a
//! [`RenderContext`]; nothing is switched behind its back.

use crate::media::MediaSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extra data handed to a page render (custom routes may supply it).
pub type RenderData = serde_json::Map<String, serde_json::Value>;

/// A page in the host's content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Unique page key, e.g. `blog/first-post`
    pub id: String,
    /// Template the page was authored for (may not exist on disk)
    #[serde(default)]
    pub intended_template: String,
    /// Set on the single page that is the site's entry point
    #[serde(default)]
    pub is_home: bool,
    /// Pages created by the generator itself (custom route content) have no
    /// backing content in the host
    #[serde(default)]
    pub synthetic: bool,
    /// Content fields, used by page filters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Page>,
}

impl Page {
    pub fn new(id: impl Into<String>, intended_template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            intended_template: intended_template.into(),
            is_home: false,
            synthetic: false,
            fields: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// A page identity for content that does not come from the page tree.
    pub fn synthetic(id: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(id, "")
        }
    }

    /// Last segment of the id.
    pub fn slug(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    /// Look up a filterable attribute by name.
    ///
    /// Built-in attributes (`id`, `slug`, `intendedTemplate`, `isHomePage`)
    /// take precedence over content fields of the same name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "slug" => Some(self.slug().to_string()),
            "intendedTemplate" | "template" => Some(self.intended_template.clone()),
            "isHomePage" => Some(self.is_home.to_string()),
            _ => self.fields.get(name).cloned(),
        }
    }
}

/// Flatten a page tree into crawl order: each page, then its descendants.
pub fn flatten_index(tree: &[Page]) -> Vec<Page> {
    let mut index = Vec::new();
    for page in tree {
        index.push(page.clone());
        index.extend(flatten_index(&page.children));
    }
    index
}

/// Languages configured in the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Languages {
    /// Default language code. `None` means the site is not multi-language.
    pub default: Option<String>,
    /// All language codes, default included, in host order.
    pub codes: Vec<String>,
}

impl Languages {
    /// A site without multi-language support.
    pub fn single() -> Self {
        Self::default()
    }

    pub fn multi(default: &str, codes: &[&str]) -> Self {
        Self {
            default: Some(default.to_string()),
            codes: codes.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Languages the crawler iterates over.
    ///
    /// A single-language site yields exactly one `None` entry so the crawl
    /// loop runs once without a language code.
    pub fn run_list(&self) -> Vec<Option<String>> {
        if self.default.is_none() {
            return vec![None];
        }
        self.codes.iter().cloned().map(Some).collect()
    }
}

/// Named URL roots of the host (`base`, `index`, `media`, `assets`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urls(BTreeMap<String, String>);

impl Urls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, url: &str) -> Self {
        self.0.insert(name.to_string(), url.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The configured base URL, if any.
    pub fn base(&self) -> Option<&str> {
        self.get("base").filter(|b| !b.is_empty())
    }
}

/// Re-root every relative URL of `urls` under `base_url`.
///
/// A root of exactly `/` becomes `base_url`, other relative roots get it
/// prepended, and roots that are already absolute (`http…`) are kept.
pub fn with_base_url(urls: &Urls, base_url: &str) -> Urls {
    let rebased = urls
        .0
        .iter()
        .map(|(name, url)| {
            let url = if url.starts_with("http") {
                url.clone()
            } else if url == "/" {
                base_url.to_string()
            } else {
                format!("{base_url}{url}")
            };
            (name.clone(), url)
        })
        .collect();
    Urls(rebased)
}

/// Identifies one isolated cache scope.
///
/// Every language or page switch opens a new scope. Hosts that cache
/// rendered fragments must key them by scope so no state leaks between two
/// renders of the same page in different languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheScope(pub u64);

/// Everything a host needs to render one page as if it were served live.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Language to render in; `None` on single-language sites.
    pub language: Option<&'a str>,
    /// URL roots the run operates under (placeholder-based if the host had
    /// no base URL).
    pub urls: &'a Urls,
    /// The URL the page would be requested at.
    pub request_url: String,
    pub cache_scope: CacheScope,
}

/// A render failure reported by the host.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct RenderFailure {
    pub message: String,
    /// Template or source file the failure originated in
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

impl RenderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn at(mut self, file: impl Into<PathBuf>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

/// What the host's internal router produced for a route pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResult {
    Page(Page),
    Body(String),
    None,
}

/// A static file shipped by a host plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginAsset {
    /// Plugin name, e.g. `vendor/gallery`
    pub plugin: String,
    /// Path of the asset relative to the plugin's asset folder
    pub path: String,
    /// Absolute source file
    pub root: PathBuf,
}

/// The CMS collaborator.
///
/// Implementations must be side-effect free apart from what the
/// [`RenderContext`] asks for: the generator calls them serially, once per
/// page and language, in crawl order.
pub trait Host {
    /// Project root; relative configuration paths resolve against it and
    /// error locations are reported relative to it.
    fn root(&self) -> &Path;

    /// URL roots as currently configured.
    fn urls(&self) -> Urls;

    fn languages(&self) -> Languages;

    /// The full page tree in site order.
    fn site_index(&self) -> Vec<Page>;

    /// The site's global asset folder, copied verbatim unless configured
    /// otherwise.
    fn assets_root(&self) -> Option<PathBuf> {
        None
    }

    /// Generator options from the host's settings store.
    fn settings(&self) -> Option<toml::Value> {
        None
    }

    fn find_page(&self, id: &str) -> Option<Page>;

    /// Public URL of `page` in `language`, built from `urls`.
    fn url_for(&self, page: &Page, language: Option<&str>, urls: &Urls) -> String;

    fn translation_exists(&self, page: &Page, language: Option<&str>) -> bool;

    /// Run a route pattern through the host's router.
    fn dispatch(&self, route: &str, context: &RenderContext<'_>) -> RouteResult;

    /// Render `page` to markup.
    ///
    /// Media files the templates reference must be reported to `media`.
    fn render(
        &self,
        page: &Page,
        context: &RenderContext<'_>,
        data: &RenderData,
        media: &mut MediaSink,
    ) -> Result<String, RenderFailure>;

    fn plugin_assets(&self) -> Vec<PluginAsset> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_index_is_depth_first() {
        let mut blog = Page::new("blog", "blog");
        blog.children = vec![
            Page::new("blog/first", "article"),
            Page::new("blog/second", "article"),
        ];
        let tree = vec![Page::new("home", "home"), blog, Page::new("about", "default")];

        let ids: Vec<String> = flatten_index(&tree).into_iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec!["home", "blog", "blog/first", "blog/second", "about"]
        );
    }

    #[test]
    fn single_language_runs_once_without_code() {
        assert_eq!(Languages::single().run_list(), vec![None]);
    }

    #[test]
    fn multi_language_runs_every_code() {
        let languages = Languages::multi("en", &["en", "fr"]);
        assert_eq!(
            languages.run_list(),
            vec![Some("en".to_string()), Some("fr".to_string())]
        );
    }

    #[test]
    fn with_base_url_rebases_relative_roots() {
        let urls = Urls::new()
            .with("base", "")
            .with("index", "/")
            .with("media", "/media")
            .with("api", "https://api.example.com");

        let rebased = with_base_url(&urls, "https://example.com");

        assert_eq!(rebased.get("base"), Some("https://example.com"));
        assert_eq!(rebased.get("index"), Some("https://example.com"));
        assert_eq!(rebased.get("media"), Some("https://example.com/media"));
        assert_eq!(rebased.get("api"), Some("https://api.example.com"));
        // input untouched
        assert_eq!(urls.get("media"), Some("/media"));
    }

    #[test]
    fn empty_base_is_unset() {
        assert_eq!(Urls::new().with("base", "").base(), None);
        assert_eq!(Urls::new().base(), None);
    }

    #[test]
    fn page_attributes() {
        let mut page = Page::new("blog/first", "article");
        page.fields.insert("category".into(), "news".into());

        assert_eq!(page.slug(), "first");
        assert_eq!(page.attribute("intendedTemplate").as_deref(), Some("article"));
        assert_eq!(page.attribute("isHomePage").as_deref(), Some("false"));
        assert_eq!(page.attribute("category").as_deref(), Some("news"));
        assert_eq!(page.attribute("missing"), None);
    }

    #[test]
    fn render_failure_displays_message() {
        let failure = RenderFailure::new("undefined variable $title").at("/site/t.php", 12);
        assert_eq!(failure.to_string(), "undefined variable $title");
        assert_eq!(failure.line, Some(12));
    }
}

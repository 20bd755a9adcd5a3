//! Shared test utilities for the sitefreeze test suite.
//!
//! Provides filesystem helpers and [`MemoryHost`], an in-memory CMS that
//! renders predictable markup and can be told to fail, panic, skip
//! translations or reference media.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let host = MemoryHost::new(tmp.path())
//!     .with_base_url("https://cms.example.com")
//!     .with_languages(Languages::multi("en", &["en", "fr"]))
//!     .with_pages(vec![home("home"), Page::new("about", "default")])
//!     .untranslated("about", "fr");
//!
//! generate_from_config(&host).unwrap();
//! assert_eq!(list_tree(&tmp.path().join("static"))[0], ".sitefreeze");
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::host::{
    CacheScope, Host, Languages, Page, PluginAsset, RenderContext, RenderData, RenderFailure,
    RouteResult, Urls, flatten_index,
};
use crate::media::MediaSink;
use crate::rewrite::json_escape;

// =========================================================================
// Filesystem
// =========================================================================

/// Create an empty file, including its parent folders.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "").unwrap();
}

/// Sorted relative paths of every file below `root`, dot files included.
pub fn list_tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// A home page with the `home` template.
pub fn home(id: &str) -> Page {
    let mut page = Page::new(id, "home");
    page.is_home = true;
    page
}

// =========================================================================
// In-memory host
// =========================================================================

/// One call to [`Host::render`], as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub page: String,
    pub language: Option<String>,
    pub request_url: String,
    pub scope: CacheScope,
}

struct MediaFixture {
    page: String,
    source: PathBuf,
    path: String,
}

/// A CMS held entirely in memory.
///
/// URLs follow the usual layout: `{base}/{id}`, with non-default languages
/// prefixed as `{base}/{lang}/{id}`. The home page lives at the base URL.
pub struct MemoryHost {
    root: PathBuf,
    urls: Urls,
    languages: Languages,
    pages: Vec<Page>,
    settings: Option<toml::Value>,
    assets_root: Option<PathBuf>,
    routes: HashMap<String, RouteResult>,
    untranslated: HashSet<(String, String)>,
    failures: HashMap<String, RenderFailure>,
    panics: HashSet<String>,
    media: Vec<MediaFixture>,
    plugin_assets: Vec<PluginAsset>,
    renders: RefCell<Vec<RenderCall>>,
}

impl MemoryHost {
    /// A single-language host without a base URL.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            urls: Urls::new()
                .with("base", "")
                .with("index", "/")
                .with("media", "/media"),
            languages: Languages::single(),
            pages: Vec::new(),
            settings: None,
            assets_root: None,
            routes: HashMap::new(),
            untranslated: HashSet::new(),
            failures: HashMap::new(),
            panics: HashSet::new(),
            media: Vec::new(),
            plugin_assets: Vec::new(),
            renders: RefCell::new(Vec::new()),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.urls = Urls::new()
            .with("base", url)
            .with("index", url)
            .with("media", &format!("{url}/media"));
        self
    }

    pub fn with_languages(mut self, languages: Languages) -> Self {
        self.languages = languages;
        self
    }

    /// Top-level pages; children are nested in each page.
    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_route(mut self, pattern: &str, result: RouteResult) -> Self {
        self.routes.insert(pattern.to_string(), result);
        self
    }

    pub fn with_settings(mut self, settings: toml::Value) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_assets_root(mut self, root: PathBuf) -> Self {
        self.assets_root = Some(root);
        self
    }

    pub fn with_plugin_asset(mut self, asset: PluginAsset) -> Self {
        self.plugin_assets.push(asset);
        self
    }

    /// Rendering `page` references the media file `source`, served at
    /// `path` below the media URL.
    pub fn with_media(mut self, page: &str, source: &Path, path: &str) -> Self {
        self.media.push(MediaFixture {
            page: page.to_string(),
            source: source.to_path_buf(),
            path: path.to_string(),
        });
        self
    }

    /// `page` has no translation in `language`.
    pub fn untranslated(mut self, page: &str, language: &str) -> Self {
        self.untranslated
            .insert((page.to_string(), language.to_string()));
        self
    }

    /// Rendering `page` reports `failure`.
    pub fn failing(mut self, page: &str, failure: RenderFailure) -> Self {
        self.failures.insert(page.to_string(), failure);
        self
    }

    /// Rendering `page` panics.
    pub fn panicking(mut self, page: &str) -> Self {
        self.panics.insert(page.to_string());
        self
    }

    /// Every render call so far, in order.
    pub fn render_calls(&self) -> Vec<RenderCall> {
        self.renders.borrow().clone()
    }
}

impl Host for MemoryHost {
    fn root(&self) -> &Path {
        &self.root
    }

    fn urls(&self) -> Urls {
        self.urls.clone()
    }

    fn languages(&self) -> Languages {
        self.languages.clone()
    }

    fn site_index(&self) -> Vec<Page> {
        self.pages.clone()
    }

    fn assets_root(&self) -> Option<PathBuf> {
        self.assets_root.clone()
    }

    fn settings(&self) -> Option<toml::Value> {
        self.settings.clone()
    }

    fn find_page(&self, id: &str) -> Option<Page> {
        flatten_index(&self.pages).into_iter().find(|p| p.id == id)
    }

    fn url_for(&self, page: &Page, language: Option<&str>, urls: &Urls) -> String {
        let index = urls.get("index").unwrap_or_default();
        let prefix = match language {
            Some(code) if Some(code) != self.languages.default.as_deref() => {
                format!("{index}/{code}")
            }
            _ => index.to_string(),
        };
        if page.is_home {
            prefix
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), page.id)
        }
    }

    fn translation_exists(&self, page: &Page, language: Option<&str>) -> bool {
        let Some(code) = language else {
            return true;
        };
        !self
            .untranslated
            .contains(&(page.id.clone(), code.to_string()))
    }

    fn dispatch(&self, pattern: &str, _context: &RenderContext<'_>) -> RouteResult {
        self.routes.get(pattern).cloned().unwrap_or(RouteResult::None)
    }

    fn render(
        &self,
        page: &Page,
        context: &RenderContext<'_>,
        data: &RenderData,
        media: &mut MediaSink,
    ) -> Result<String, RenderFailure> {
        self.renders.borrow_mut().push(RenderCall {
            page: page.id.clone(),
            language: context.language.map(str::to_string),
            request_url: context.request_url.clone(),
            scope: context.cache_scope,
        });

        if self.panics.contains(&page.id) {
            panic!("template exploded on {}", page.id);
        }
        if let Some(failure) = self.failures.get(&page.id) {
            return Err(failure.clone());
        }

        let media_url = context.urls.get("media").unwrap_or_default();
        for fixture in self.media.iter().filter(|m| m.page == page.id) {
            media.record(&fixture.source, format!("{media_url}/{}", fixture.path));
        }

        Ok(format!(
            concat!(
                r#"<html lang="{lang}"><head><link rel="canonical" href="{url}"></head>"#,
                r#"<body><a href="{index}">Home</a><h1>{id}</h1>"#,
                r#"<script>var page = {{"url":"{json}"}};</script>"#,
                r#"<pre>{data}</pre></body></html>"#
            ),
            lang = context.language.unwrap_or(""),
            url = context.request_url,
            index = context.urls.get("index").unwrap_or_default(),
            id = page.id,
            json = json_escape(&context.request_url),
            data = serde_json::Value::Object(data.clone()),
        ))
    }

    fn plugin_assets(&self) -> Vec<PluginAsset> {
        self.plugin_assets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_language_prefixes() {
        let host = MemoryHost::new("/srv/site")
            .with_base_url("https://cms.example.com")
            .with_languages(Languages::multi("en", &["en", "fr"]));
        let urls = host.urls();

        assert_eq!(
            host.url_for(&Page::new("blog", "blog"), Some("en"), &urls),
            "https://cms.example.com/blog"
        );
        assert_eq!(
            host.url_for(&Page::new("blog", "blog"), Some("fr"), &urls),
            "https://cms.example.com/fr/blog"
        );
        assert_eq!(
            host.url_for(&home("home"), Some("fr"), &urls),
            "https://cms.example.com/fr"
        );
    }

    #[test]
    fn list_tree_includes_dot_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        touch(&tmp.path().join("b/c.txt"));
        touch(&tmp.path().join(".hidden"));
        assert_eq!(list_tree(tmp.path()), vec![".hidden", "b/c.txt"]);
    }
}

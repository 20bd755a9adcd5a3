//! Static site generation.
//!
//! Drives the host through one full run and writes the results to the output
//! folder. The run is strictly sequential:
//!
//! ```text
//! Idle → Preparing → RenderingHome → RenderingLanguages → RenderingCustomRoutes
//!      → CopyingMedia → CopyingPluginAssets → CopyingPaths → Done
//! ```
//!
//! ## Generated Files
//!
//! - **Home page** (`/index.html`): rendered first, in the default language,
//!   whatever the language loop later does
//! - **Pages** (`/{url path}/index.html`): every page of the crawl set, once
//!   per language, at the path its language-specific URL maps to
//! - **Custom routes** (`/{path}/index.html`, or `/{path}` for file-like paths)
//! - **Media and plugin assets** below the media URL path
//! - **Extra paths** under their own name in the output root
//!
//! ## Render Context
//!
//! Each page task builds its own [`RenderContext`]: language, request URL and
//! a fresh [`CacheScope`]. Nothing about a previous page or language is
//! carried into the next render.
//!
//! ## Failures
//!
//! A page that fails to render aborts the run. The error names the page,
//! the language and the template location so it can be found without a
//! stack trace; panics inside the host are reported the same way.

use crate::assets::{copy_media, copy_path, copy_plugin_assets};
use crate::config::{ConfigError, CustomRoute, GenerationConfig, apply_filters, load_host_config};
use crate::destination::{self, DestinationError};
use crate::host::{
    CacheScope, Host, Languages, Page, RenderContext, Urls, flatten_index, with_base_url,
};
use crate::media::MediaSink;
use crate::paths::{PathCleaner, resolve_run_path};
use crate::rewrite::{PLACEHOLDER_BASE_URL, UrlRewriter};
use crate::routes::{resolve_route, route_task};
use crate::trap::{self, PanicTrap};
use crate::types::{FileList, PageTask};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    UnsafeOverwrite(DestinationError),
    #[error(transparent)]
    Permission(DestinationError),
    #[error(transparent)]
    Render(RenderError),
    #[error("Fatal error: {0}")]
    FatalRuntime(RenderError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DestinationError> for GenerateError {
    fn from(err: DestinationError) -> Self {
        match err {
            DestinationError::MissingFolder => {
                GenerateError::Config(ConfigError::Validation(err.to_string()))
            }
            DestinationError::NotWritable(_) | DestinationError::NotCleared(_) => {
                GenerateError::Permission(err)
            }
            DestinationError::UnsafeOverwrite(_) => GenerateError::UnsafeOverwrite(err),
            DestinationError::Io(e) => GenerateError::Io(e),
        }
    }
}

/// A page that failed to render, with enough context to find it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Error in {file} line {line} while rendering {} \"{key}\"{}: {message}",
    subject(.home),
    language_suffix(.language)
)]
pub struct RenderError {
    /// Page id
    pub key: String,
    pub language: Option<String>,
    /// Source file, relative to the host root when possible
    pub file: String,
    pub line: u32,
    pub message: String,
    /// Whether the failure happened while rendering the home page
    pub home: bool,
}

fn subject(home: &bool) -> &'static str {
    if *home { "home page" } else { "page" }
}

fn language_suffix(language: &Option<String>) -> String {
    language
        .as_deref()
        .map(|code| format!(" ({code})"))
        .unwrap_or_default()
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Preparing,
    RenderingHome,
    RenderingLanguages,
    RenderingCustomRoutes,
    CopyingMedia,
    CopyingPluginAssets,
    CopyingPaths,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Preparing => "preparing",
            Stage::RenderingHome => "rendering home",
            Stage::RenderingLanguages => "rendering languages",
            Stage::RenderingCustomRoutes => "rendering custom routes",
            Stage::CopyingMedia => "copying media",
            Stage::CopyingPluginAssets => "copying plugin assets",
            Stage::CopyingPaths => "copying paths",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// One generation run over a crawl set.
pub struct Generator<'h, H: Host + ?Sized> {
    host: &'h H,
    config: GenerationConfig,
    pages: Vec<Page>,
    languages: Languages,
    /// URL roots the run renders under
    urls: Urls,
    /// Base URL the rendered markup is rewritten from
    original_base_url: String,
    cleaner: PathCleaner,
    files: FileList,
    media: MediaSink,
    stage: Stage,
    scopes_opened: u64,
}

impl<'h, H: Host + ?Sized> Generator<'h, H> {
    /// Prepare a run. `pages` is the crawl set in crawl order.
    ///
    /// Relative output and extra paths are anchored at the host root, and a
    /// config without languages takes the host's. When the host has no base
    /// URL, its URL roots are re-rooted under the placeholder base so
    /// templates can still build absolute URLs.
    pub fn new(host: &'h H, mut config: GenerationConfig, pages: Vec<Page>) -> Self {
        config.output_folder = resolve_run_path(&config.output_folder, host.root());
        config.copy_paths = config
            .copy_paths
            .iter()
            .map(|path| resolve_run_path(path, host.root()))
            .collect();
        let languages = config
            .languages
            .clone()
            .unwrap_or_else(|| host.languages());

        let host_urls = host.urls();
        let urls = match host_urls.base() {
            Some(_) => host_urls,
            None => with_base_url(&host_urls, PLACEHOLDER_BASE_URL),
        };
        let original_base_url = urls.base().unwrap_or(PLACEHOLDER_BASE_URL).to_string();
        let cleaner = PathCleaner::new(&config.index_file_name);

        Self {
            host,
            config,
            pages,
            languages,
            urls,
            original_base_url,
            cleaner,
            files: FileList::new(),
            media: MediaSink::new(),
            stage: Stage::Idle,
            scopes_opened: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn files(&self) -> &FileList {
        &self.files
    }

    pub fn original_base_url(&self) -> &str {
        &self.original_base_url
    }

    /// Run the full pipeline: prepare the output folder, render everything,
    /// copy extra paths. Returns every file written or copied.
    pub fn generate(&mut self) -> Result<FileList, GenerateError> {
        self.files = FileList::new();
        self.enter(Stage::Preparing);

        let output = self.config.output_folder.clone();
        destination::check_output_folder(&output, &self.config.index_file_name)?;
        destination::write_marker(&output)?;
        if !destination::clear_folder(&output, &self.config.preserve) {
            return Err(DestinationError::NotCleared(output).into());
        }

        self.generate_pages()?;

        self.enter(Stage::CopyingPaths);
        for path in &self.config.copy_paths {
            copy_path(path, &output, &mut self.files)?;
        }

        self.enter(Stage::Done);
        tracing::info!(
            files = self.files.len(),
            path = %output.display(),
            "Static site generated"
        );
        Ok(self.files.clone())
    }

    /// Render the home page, every page per language, and the custom routes,
    /// then copy media and plugin assets. Does not touch anything else in the
    /// output folder.
    pub fn generate_pages(&mut self) -> Result<FileList, GenerateError> {
        let _trap = PanicTrap::install();
        let target_base_url = self.config.base_url.trim_end_matches('/').to_string();
        self.media.set_active(!self.config.skip_media);

        self.enter(Stage::RenderingHome);
        if let Some(home) = self.pages.iter().find(|p| p.is_home).cloned() {
            let path = self.config.output_folder.join(&self.config.index_file_name);
            let language = self.languages.default.clone();
            let mut task = PageTask::new(home, language, path, &target_base_url);
            task.is_home = true;
            self.render_task(&task)?;
        }

        self.enter(Stage::RenderingLanguages);
        for language in self.languages.run_list() {
            self.generate_pages_by_language(language.as_deref(), &target_base_url)?;
        }

        self.enter(Stage::RenderingCustomRoutes);
        let routes = self.config.custom_routes.clone();
        for (position, route) in routes.iter().enumerate() {
            self.generate_custom_route(position, route, &target_base_url)?;
        }

        let records = self.media.drain();
        if !self.config.skip_media {
            self.enter(Stage::CopyingMedia);
            copy_media(
                &records,
                &self.original_base_url,
                &self.config.output_folder,
                &self.cleaner,
                &mut self.files,
            );
        }

        if !self.config.skip_plugin_assets {
            self.enter(Stage::CopyingPluginAssets);
            let media_url = self
                .urls
                .get("media")
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}/media", self.original_base_url));
            copy_plugin_assets(
                &self.host.plugin_assets(),
                &media_url,
                &self.config.output_folder,
                &self.cleaner,
                &mut self.files,
            );
        }

        Ok(self.files.clone())
    }

    fn generate_pages_by_language(
        &mut self,
        language: Option<&str>,
        target_base_url: &str,
    ) -> Result<(), GenerateError> {
        let tasks: Vec<PageTask> = self
            .pages
            .iter()
            .filter(|page| {
                let keep = !self.config.ignore_untranslated_pages
                    || self.host.translation_exists(page, language);
                if !keep {
                    tracing::debug!(page = %page.id, language = ?language, "Skipping untranslated page");
                }
                keep
            })
            .map(|page| self.page_task(page, language, target_base_url))
            .collect();

        tracing::debug!(language = ?language, pages = tasks.len(), "Rendering language");
        for task in &tasks {
            self.render_task(task)?;
        }
        Ok(())
    }

    /// Output task for `page` in `language`, at the path its URL maps to.
    fn page_task(&self, page: &Page, language: Option<&str>, target_base_url: &str) -> PageTask {
        let url = self.host.url_for(page, language, &self.urls);
        let url_path = url.replace(&self.original_base_url, "/");
        let path = self.cleaner.page_file(&self.config.output_folder, &url_path);
        PageTask::new(
            page.clone(),
            language.map(str::to_string),
            path,
            target_base_url,
        )
    }

    fn generate_custom_route(
        &mut self,
        position: usize,
        route: &CustomRoute,
        target_base_url: &str,
    ) -> Result<(), GenerateError> {
        let cache_scope = self.open_scope();
        let resolved = {
            let context = RenderContext {
                language: route.language_code.as_deref(),
                urls: &self.urls,
                request_url: format!(
                    "{}/{}",
                    self.original_base_url,
                    route.path.trim_start_matches('/')
                ),
                cache_scope,
            };
            let host = self.host;
            trap::catch(|| resolve_route(host, route, &context))
        };
        let source = resolved.map_err(|panic| {
            GenerateError::FatalRuntime(self.locate(
                &route.path,
                route.language_code.clone(),
                false,
                panic.message,
                panic.file.map(PathBuf::from),
                panic.line,
            ))
        })?;

        let Some(source) = source else {
            tracing::debug!(path = %route.path, "Custom route resolved to nothing");
            return Ok(());
        };
        let task = route_task(
            route,
            source,
            position,
            &self.config.output_folder,
            &self.cleaner,
            target_base_url,
        );
        self.render_task(&task)
    }

    /// Render (unless pre-rendered), rewrite, write and record one task.
    fn render_task(&mut self, task: &PageTask) -> Result<(), GenerateError> {
        let cache_scope = self.open_scope();
        let content = match &task.content {
            Some(content) => content.clone(),
            None => {
                let host = self.host;
                let urls = &self.urls;
                let media = &mut self.media;
                let rendered = trap::catch(|| {
                    let language = task.language.as_deref();
                    let context = RenderContext {
                        language,
                        urls,
                        request_url: host.url_for(&task.page, language, urls),
                        cache_scope,
                    };
                    host.render(&task.page, &context, &task.data, media)
                });
                match rendered {
                    Ok(Ok(markup)) => markup,
                    Ok(Err(failure)) => {
                        return Err(GenerateError::Render(self.locate(
                            &task.page.id,
                            task.language.clone(),
                            task.is_home,
                            failure.message,
                            failure.file,
                            failure.line,
                        )));
                    }
                    Err(panic) => {
                        return Err(GenerateError::FatalRuntime(self.locate(
                            &task.page.id,
                            task.language.clone(),
                            task.is_home,
                            panic.message,
                            panic.file.map(PathBuf::from),
                            panic.line,
                        )));
                    }
                }
            }
        };

        let rewritten = UrlRewriter::new(&self.original_base_url, &task.base_url).rewrite(&content);
        destination::write_file(&task.path, &rewritten)?;
        tracing::debug!(
            page = %task.page.id,
            language = ?task.language,
            path = %task.path.display(),
            "Wrote page"
        );
        self.files.insert(task.path.clone());
        Ok(())
    }

    fn locate(
        &self,
        key: &str,
        language: Option<String>,
        home: bool,
        message: String,
        file: Option<PathBuf>,
        line: Option<u32>,
    ) -> RenderError {
        let file = match file {
            Some(file) => match file.strip_prefix(self.host.root()) {
                Ok(relative) => format!("/{}", relative.display()),
                Err(_) => file.display().to_string(),
            },
            None => "<unknown>".to_string(),
        };
        RenderError {
            key: key.to_string(),
            language,
            file,
            line: line.unwrap_or(0),
            message,
            home,
        }
    }

    fn open_scope(&mut self) -> CacheScope {
        self.scopes_opened += 1;
        CacheScope(self.scopes_opened)
    }

    fn enter(&mut self, stage: Stage) {
        tracing::info!(stage = %stage, "Generation stage");
        self.stage = stage;
    }
}

/// Generate a site from a pre-built configuration and crawl set.
pub fn generate<H: Host + ?Sized>(
    host: &H,
    config: GenerationConfig,
    pages: Vec<Page>,
) -> Result<FileList, GenerateError> {
    Generator::new(host, config, pages).generate()
}

/// Generate a site from the host's layered configuration.
///
/// The crawl set is the host's full page index with the configured filters
/// (custom filters, then skipped templates) applied.
pub fn generate_from_config<H: Host + ?Sized>(host: &H) -> Result<FileList, GenerateError> {
    let file_config = load_host_config(host)?;
    let pages = apply_filters(flatten_index(&host.site_index()), &file_config.page_filters());
    let config = GenerationConfig::resolve(&file_config, host);
    generate(host, config, pages)
}

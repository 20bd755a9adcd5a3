//! Generator configuration.
//!
//! Handles loading, validating, and merging generator options. Configuration
//! is layered: stock defaults are overridden by the project's
//! `sitefreeze.toml`, which is in turn overridden by options from the host's
//! settings store.
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── sitefreeze.toml     # Project config (overrides stock defaults)
//! ├── content/
//! └── site/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! output_folder = "./static"        # Relative to the project root when it starts with "."
//! base_url = "/"                    # Base URL the static site is served under
//! preserve = []                     # Top-level names in the output folder never cleared
//! skip_media = false                # Don't copy media files referenced by pages
//! skip_plugin_assets = false        # Don't copy plugin assets
//! skip_templates = []               # Don't render pages with these templates
//! ignore_untranslated_pages = false # Skip pages without a translation per language
//! index_file_name = "index.html"    # File name every page is written to
//! copy_paths = []                   # Extra folders/files to copy (default: the site's assets)
//!
//! [[custom_routes]]
//! path = "sitemap.xml"              # Output path below the output folder
//! route = "sitemap.xml"             # Host route to render (defaults to `path`)
//!
//! [[custom_filters]]
//! field = "status"
//! operator = "!="
//! value = "draft"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::host::{Host, Languages, Page, RenderData};
use crate::paths::resolve_relative_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project config file.
pub const CONFIG_FILENAME: &str = "sitefreeze.toml";

pub const DEFAULT_INDEX_FILE_NAME: &str = "index.html";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator options as written in `sitefreeze.toml`.
///
/// All fields have defaults. User config need only specify the values to
/// override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Output folder; a leading `.` makes it relative to the project root.
    pub output_folder: String,
    /// Base URL of the published site.
    pub base_url: String,
    /// Top-level names in the output folder that are never cleared.
    pub preserve: Vec<String>,
    pub skip_media: bool,
    pub skip_plugin_assets: bool,
    /// Templates whose pages are not rendered. `home` is always rendered.
    pub skip_templates: Vec<String>,
    pub custom_routes: Vec<CustomRoute>,
    /// Filters applied to the page index before the run, in order.
    pub custom_filters: Vec<PageFilter>,
    pub ignore_untranslated_pages: bool,
    pub index_file_name: String,
    /// Extra folders or files copied into the output root. Empty means the
    /// host's asset folder.
    pub copy_paths: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_folder: "./static".to_string(),
            base_url: "/".to_string(),
            preserve: Vec::new(),
            skip_media: false,
            skip_plugin_assets: false,
            skip_templates: Vec::new(),
            custom_routes: Vec::new(),
            custom_filters: Vec::new(),
            ignore_untranslated_pages: false,
            index_file_name: DEFAULT_INDEX_FILE_NAME.to_string(),
            copy_paths: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_folder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_folder must not be empty".into(),
            ));
        }
        if let Some(route) = self.custom_routes.iter().find(|r| r.path.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "custom_routes entries need a path (route: {:?}, page: {:?})",
                route.route, route.page
            )));
        }
        if let Some(filter) = self.custom_filters.iter().find(|f| f.field.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "custom_filters entries need a field (operator: {})",
                filter.operator
            )));
        }
        Ok(())
    }

    /// All page filters of the run: custom filters followed by one excluding
    /// `skip_templates`.
    pub fn page_filters(&self) -> Vec<PageFilter> {
        let mut filters = self.custom_filters.clone();
        let skipped: Vec<String> = self
            .skip_templates
            .iter()
            .filter(|t| t.as_str() != "home")
            .cloned()
            .collect();
        if !skipped.is_empty() {
            filters.push(PageFilter {
                field: "intendedTemplate".to_string(),
                operator: FilterOperator::NotIn,
                value: FilterValue::Many(skipped),
            });
        }
        filters
    }
}

/// An extra output not derived from the page tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRoute {
    /// Output path below the output folder.
    pub path: String,
    /// Id of a page to render at `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Literal body written at `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Host route resolved for content; defaults to `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Base URL override for this output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Extra render data.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: RenderData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl CustomRoute {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "==")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "*=")]
    Contains,
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Contains => "*=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    fn as_list(&self) -> Vec<String> {
        match self {
            Self::Flag(flag) => vec![flag.to_string()],
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// A predicate over page attributes, e.g. `status != draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl PageFilter {
    pub fn matches(&self, page: &Page) -> bool {
        let actual = page.attribute(&self.field).unwrap_or_default();
        let values = self.value.as_list();
        match self.operator {
            FilterOperator::Equals => values.first().is_some_and(|v| *v == actual),
            FilterOperator::NotEquals => values.first().is_none_or(|v| *v != actual),
            FilterOperator::In => values.contains(&actual),
            FilterOperator::NotIn => !values.contains(&actual),
            FilterOperator::Contains => values.iter().any(|v| actual.contains(v.as_str())),
        }
    }
}

/// Keep the pages every filter accepts.
pub fn apply_filters(pages: Vec<Page>, filters: &[PageFilter]) -> Vec<Page> {
    pages
        .into_iter()
        .filter(|page| filters.iter().all(|f| f.matches(page)))
        .collect()
}

/// Reduce an index file name to ASCII alphanumerics and dots.
///
/// Returns `None` when nothing but dots is left, in which case the caller
/// keeps its current name.
pub fn sanitize_index_file_name(name: &str) -> Option<String> {
    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect();
    if sanitized.chars().all(|c| c == '.') {
        return None;
    }
    Some(sanitized)
}

/// Configuration of one generation run, with every path resolved.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Absolute output folder
    pub output_folder: PathBuf,
    /// Target base URL, without trailing slash
    pub base_url: String,
    pub preserve: Vec<String>,
    pub skip_media: bool,
    pub skip_plugin_assets: bool,
    pub custom_routes: Vec<CustomRoute>,
    pub ignore_untranslated_pages: bool,
    pub index_file_name: String,
    /// Languages to render; `None` takes the host's languages.
    pub languages: Option<Languages>,
    /// Absolute extra paths to copy
    pub copy_paths: Vec<PathBuf>,
}

impl GenerationConfig {
    /// Resolve file options against the host.
    pub fn resolve<H: Host + ?Sized>(config: &GeneratorConfig, host: &H) -> Self {
        let copy_paths = if config.copy_paths.is_empty() {
            host.assets_root().into_iter().collect()
        } else {
            config
                .copy_paths
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| resolve_relative_path(p, host.root()))
                .collect()
        };

        Self {
            output_folder: resolve_relative_path(&config.output_folder, host.root()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            preserve: config.preserve.clone(),
            skip_media: config.skip_media,
            skip_plugin_assets: config.skip_plugin_assets,
            custom_routes: config.custom_routes.clone(),
            ignore_untranslated_pages: config.ignore_untranslated_pages,
            index_file_name: sanitize_index_file_name(&config.index_file_name)
                .unwrap_or_else(|| DEFAULT_INDEX_FILE_NAME.to_string()),
            languages: Some(host.languages()),
            copy_paths,
        }
    }

    /// A config for the given output folder, base URL and preserve list,
    /// everything else at its defaults.
    pub fn new(output_folder: impl Into<PathBuf>, base_url: &str, preserve: &[String]) -> Self {
        Self {
            output_folder: output_folder.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            preserve: preserve.to_vec(),
            skip_media: false,
            skip_plugin_assets: false,
            custom_routes: Vec::new(),
            ignore_untranslated_pages: false,
            index_file_name: DEFAULT_INDEX_FILE_NAME.to_string(),
            languages: None,
            copy_paths: Vec::new(),
        }
    }

    /// Set the index file name if it survives sanitizing.
    pub fn with_index_file_name(mut self, name: &str) -> Self {
        if let Some(name) = sanitize_index_file_name(name) {
            self.index_file_name = name;
        }
        self
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GeneratorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so
///   `custom_routes` in a later layer replaces the earlier list.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `sitefreeze.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `sitefreeze.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Load the full layered config for a host: stock defaults, then the
/// project file, then the host's settings store.
pub fn load_host_config<H: Host + ?Sized>(host: &H) -> Result<GeneratorConfig, ConfigError> {
    let base = match load_raw_config(host.root())? {
        Some(file) => merge_toml(stock_defaults_value(), file),
        None => stock_defaults_value(),
    };
    resolve_config(base, host.settings())
}

/// Returns a fully-commented stock `sitefreeze.toml`.
pub fn stock_config_toml() -> &'static str {
    r##"# Sitefreeze Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Options set in the CMS settings store override this file.
# Unknown keys will cause an error.

# Output folder. Paths starting with "." are relative to the project root.
# WARNING: everything in this folder not starting with "." is erased before
# each run, except names listed in `preserve`.
output_folder = "./static"

# Base URL the static site will be served under. "/" produces
# root-relative links.
base_url = "/"

# Top-level files or folders in the output folder that survive clearing.
preserve = []

# Skip copying media files referenced by rendered pages.
skip_media = false

# Skip copying plugin assets.
skip_plugin_assets = false

# Pages with these templates are not rendered. The home page always is.
skip_templates = []

# Skip a page in a language it has no translation for.
ignore_untranslated_pages = false

# File every page is written to. Only letters, digits and "." are kept.
index_file_name = "index.html"

# Extra folders or files copied into the output root.
# Empty means the site's asset folder.
copy_paths = []

# ---------------------------------------------------------------------------
# Custom routes: extra outputs not in the page tree
# ---------------------------------------------------------------------------
# [[custom_routes]]
# path = "sitemap.xml"      # output path (required)
# route = "sitemap.xml"     # host route to render, defaults to `path`
# page = "blog"             # or: render this page at `path`
# content = "..."           # or: write this literal body
# base_url = "https://cdn.example.com"
# language_code = "en"
# data = { feed = true }    # extra render data

# ---------------------------------------------------------------------------
# Custom filters: applied to the page list before rendering
# ---------------------------------------------------------------------------
# Operators: "==", "!=", "in", "not in", "*=" (contains)
# [[custom_filters]]
# field = "intendedTemplate"
# operator = "not in"
# value = ["draft", "private"]
"##
}

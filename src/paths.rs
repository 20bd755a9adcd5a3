//! Filesystem path resolution and output path cleaning.
//!
//! ## Output Paths
//!
//! Every page is written to `<url path>/<index file>`. That is wrong for
//! pages whose URL already names a file: a page served at `/docs/report.pdf`
//! must land at `/docs/report.pdf`, not `/docs/report.pdf/index.html`.
//! [`PathCleaner`] absorbs the index file into any final segment that carries
//! an extension:
//!
//! ```text
//! /about//index.html          → /about/index.html
//! /docs/report.pdf/index.html → /docs/report.pdf
//! /feed.atom/index.html       → /feed.atom
//! /data/export.geojson/index.html → /data/export.geojson
//! ```
//!
//! Common web extensions (2 to 5 letters) are matched first; a second, looser
//! pass catches any other dotted final segment.

use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolve a configuration path to an absolute filesystem path.
///
/// Paths starting with `.` are taken relative to `project_root`. Paths that
/// can be canonicalized are; paths that don't exist yet are returned with
/// `.` components removed.
pub fn resolve_relative_path(path: &str, project_root: &Path) -> PathBuf {
    if path.is_empty() || !path.starts_with('.') {
        return canonical_or_literal(Path::new(path));
    }
    canonical_or_literal(&project_root.join(path))
}

/// Anchor a run path (output folder, extra path) at `project_root`.
///
/// Relative paths, with or without a leading `./`, end up under the project
/// root, so every output path of a run is absolute when the root is. An
/// empty path stays empty.
pub fn resolve_run_path(path: &Path, project_root: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    let anchored = if path.is_relative() {
        project_root.join(path)
    } else {
        path.to_path_buf()
    };
    anchored
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn canonical_or_literal(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    })
}

/// Cleans output paths for one index file name.
#[derive(Debug, Clone)]
pub struct PathCleaner {
    index_file_name: String,
    short_extension: Regex,
    any_extension: Regex,
}

impl PathCleaner {
    pub fn new(index_file_name: &str) -> Self {
        let index = regex::escape(index_file_name);
        let short_extension = Regex::new(&format!(r"(?i)([^/]+\.[a-z]{{2,5}})/{index}$"))
            .expect("escaped index file name is a valid pattern");
        let any_extension = Regex::new(&format!(r"(?i)(\.[^/.]+)/{index}$"))
            .expect("escaped index file name is a valid pattern");
        Self {
            index_file_name: index_file_name.to_string(),
            short_extension,
            any_extension,
        }
    }

    /// Collapse doubled separators and absorb the index file into a final
    /// segment that already looks like a file.
    pub fn clean(&self, raw: &str) -> String {
        let path = raw.replace("//", "/");
        let path = self.short_extension.replace(&path, "${1}");
        let path = self.any_extension.replace(&path, "${1}").into_owned();

        if path.contains("//") {
            return self.clean(&path);
        }
        path
    }

    /// Output file for a page served at `url_path`.
    ///
    /// Only the URL part is cleaned; the output folder itself is never
    /// rewritten, even if its own name contains a dot.
    pub fn page_file(&self, output_folder: &Path, url_path: &str) -> PathBuf {
        let cleaned = self.clean(&format!("/{url_path}/{}", self.index_file_name));
        output_folder.join(cleaned.trim_start_matches('/'))
    }

    /// Output file for an asset served at `url_path`.
    pub fn asset_file(&self, output_folder: &Path, url_path: &str) -> PathBuf {
        let cleaned = self.clean(&format!("/{url_path}"));
        output_folder.join(cleaned.trim_start_matches('/'))
    }
}

/// One-off form of [`PathCleaner::clean`].
pub fn clean_output_path(raw: &str, index_file_name: &str) -> String {
    PathCleaner::new(index_file_name).clean(raw)
}

/// Last path segment, used to name copied folders in the output root.
pub fn folder_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

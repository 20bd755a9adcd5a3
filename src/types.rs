//! Shared types passed between the crawler, the route expander and the
//! asset copier.

use crate::host::{Page, RenderData};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Every absolute path written or copied during a run, in write order.
///
/// Inserting a path twice keeps the first position, so rewriting a file
/// (the home page is written by both the home pass and the language pass)
/// does not duplicate it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileList {
    paths: Vec<PathBuf>,
    #[serde(skip)]
    seen: HashSet<PathBuf>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.seen.contains(&path) {
            return false;
        }
        self.seen.insert(path.clone());
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl<P: Into<PathBuf>> Extend<P> for FileList {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path);
        }
    }
}

/// One unit of output: a page rendered in one language to one file.
#[derive(Debug, Clone)]
pub struct PageTask {
    pub page: Page,
    pub language: Option<String>,
    /// Absolute output file
    pub path: PathBuf,
    /// Base URL the output is rewritten to
    pub base_url: String,
    pub data: RenderData,
    /// Pre-rendered body; when set the host render is skipped
    pub content: Option<String>,
    pub is_home: bool,
}

impl PageTask {
    pub fn new(page: Page, language: Option<String>, path: PathBuf, base_url: &str) -> Self {
        Self {
            page,
            language,
            path,
            base_url: base_url.to_string(),
            data: RenderData::new(),
            content: None,
            is_home: false,
        }
    }
}

/// A media file a template referenced during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MediaRecord {
    /// Source file on disk
    pub root: PathBuf,
    /// Public URL the template emitted
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_list_is_duplicate_free_and_ordered() {
        let mut list = FileList::new();
        assert!(list.insert("/out/index.html"));
        assert!(list.insert("/out/blog/index.html"));
        assert!(!list.insert("/out/index.html"));

        assert_eq!(
            list.as_slice(),
            &[
                PathBuf::from("/out/index.html"),
                PathBuf::from("/out/blog/index.html")
            ]
        );
    }

    #[test]
    fn file_list_extend_uses_set_union() {
        let mut list = FileList::new();
        list.insert("/out/a");
        list.extend(["/out/b", "/out/a", "/out/c"]);

        assert_eq!(list.len(), 3);
        assert!(list.contains(Path::new("/out/c")));
    }

    #[test]
    fn file_list_serializes_as_array() {
        let mut list = FileList::new();
        list.insert("/out/index.html");
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["/out/index.html"]"#);
    }
}

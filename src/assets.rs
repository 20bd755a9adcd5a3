//! Copying media, plugin assets and extra paths into the output folder.
//!
//! ## Output Structure
//!
//! ```text
//! static/
//! ├── media/
//! │   ├── pages/blog/5f3a…/cover.jpg     # media referenced while rendering
//! │   └── plugins/vendor/gallery/app.js  # plugin assets, one folder per plugin
//! └── assets/                            # extra paths, under their own name
//!     └── css/site.css
//! ```
//!
//! A media file or plugin asset that cannot be copied is logged and skipped;
//! the page referencing it has already been written. Failing to copy an
//! extra path is an error.

use crate::destination::{clear_folder, copy_dir, copy_file};
use crate::host::PluginAsset;
use crate::paths::{PathCleaner, folder_name};
use crate::types::{FileList, MediaRecord};
use std::io;
use std::path::Path;

/// Copy every media record to the output path its URL maps to.
pub fn copy_media(
    records: &[MediaRecord],
    original_base_url: &str,
    output_folder: &Path,
    cleaner: &PathCleaner,
    files: &mut FileList,
) {
    for record in records {
        let url_path = strip_base(&record.url, original_base_url);
        let target = cleaner.asset_file(output_folder, &url_path);
        match copy_file(&record.root, &target) {
            Ok(()) => {
                files.insert(target);
            }
            Err(e) => {
                tracing::warn!(
                    source = %record.root.display(),
                    url = %record.url,
                    error = %e,
                    "Failed to copy media file"
                );
            }
        }
    }
}

/// Copy plugin assets to `<media path>/plugins/<plugin>/<asset path>`.
pub fn copy_plugin_assets(
    assets: &[PluginAsset],
    media_url: &str,
    output_folder: &Path,
    cleaner: &PathCleaner,
    files: &mut FileList,
) {
    let media = media_path(media_url);
    for asset in assets {
        let url_path = format!("{media}/plugins/{}/{}", asset.plugin, asset.path);
        let target = cleaner.asset_file(output_folder, &url_path);
        match copy_file(&asset.root, &target) {
            Ok(()) => {
                files.insert(target);
            }
            Err(e) => {
                tracing::warn!(
                    plugin = %asset.plugin,
                    source = %asset.root.display(),
                    error = %e,
                    "Failed to copy plugin asset"
                );
            }
        }
    }
}

/// Copy a folder or file into the output root under its own name.
///
/// A folder target is cleared first so files deleted from the source do not
/// linger. Missing sources are skipped.
pub fn copy_path(source: &Path, output_folder: &Path, files: &mut FileList) -> io::Result<()> {
    if !source.exists() {
        tracing::debug!(path = %source.display(), "Copy path does not exist, skipping");
        return Ok(());
    }
    let Some(name) = folder_name(source) else {
        return Ok(());
    };
    let target = output_folder.join(name);

    if source.is_file() {
        copy_file(source, &target)?;
        files.insert(target);
        return Ok(());
    }

    if !clear_folder(&target, &[]) {
        tracing::warn!(path = %target.display(), "Could not fully clear copy target");
    }
    let copied = copy_dir(source, &target)?;
    tracing::debug!(path = %source.display(), count = copied.len(), "Copied folder");
    files.extend(copied);
    Ok(())
}

/// Path part of the media URL root, e.g. `/media` for
/// `https://example.com/media`.
pub fn media_path(media_url: &str) -> String {
    match url::Url::parse(media_url) {
        Ok(parsed) => parsed.path().trim_end_matches('/').to_string(),
        Err(_) => media_url.trim_end_matches('/').to_string(),
    }
}

fn strip_base(url: &str, original_base_url: &str) -> String {
    if original_base_url.is_empty() {
        return url.to_string();
    }
    url.replace(original_base_url, "/")
}

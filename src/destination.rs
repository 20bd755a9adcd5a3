//! Output folder management.
//!
//! A run clears the output folder before writing, so the folder has to be
//! proven safe first. [`check_output_folder`] accepts:
//!
//! - a folder that does not exist yet or is empty
//! - a writable folder that already carries the [`MARKER_FILE`] or an index
//!   file at its top level (i.e. a previous run's output)
//!
//! Anything else is refused before a single file is touched.
//!
//! [`clear_folder`] then removes every top-level entry except names on the
//! preserve list and dot-files (the marker included).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Zero-byte file marking a folder as a generation target.
pub const MARKER_FILE: &str = ".sitefreeze";

#[derive(Error, Debug)]
pub enum DestinationError {
    #[error("Please specify a valid output folder")]
    MissingFolder,
    #[error("The output folder is not writable: {}", .0.display())]
    NotWritable(PathBuf),
    #[error(
        "The output folder \"{}\" already contains other files or folders. \
         Please specify a path that does not exist yet, or is empty. If it has to be this path, \
         create an empty .sitefreeze file in it and retry. WARNING: everything in the output \
         folder not starting with \".\" is erased before generation, unless it is on the preserve list.",
        .0.display()
    )]
    UnsafeOverwrite(PathBuf),
    #[error("Could not remove every entry from the output folder: {}", .0.display())]
    NotCleared(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Refuse output folders that look like they belong to someone else.
pub fn check_output_folder(folder: &Path, index_file_name: &str) -> Result<(), DestinationError> {
    if folder.as_os_str().is_empty() {
        return Err(DestinationError::MissingFolder);
    }

    let names = top_level_names(folder)?;
    if names.is_empty() {
        return Ok(());
    }

    ensure_writable(folder)?;

    if names
        .iter()
        .any(|name| name == MARKER_FILE || name == index_file_name)
    {
        return Ok(());
    }

    Err(DestinationError::UnsafeOverwrite(folder.to_path_buf()))
}

/// Create a scratch file in `folder` to find out whether the current user
/// can write there. Permission bits alone do not answer that.
fn ensure_writable(folder: &Path) -> Result<(), DestinationError> {
    match tempfile::Builder::new()
        .prefix(MARKER_FILE)
        .tempfile_in(folder)
    {
        Ok(_) => Ok(()),
        Err(e) => Err(not_writable_or_io(folder, e)),
    }
}

fn not_writable_or_io(folder: &Path, err: io::Error) -> DestinationError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        DestinationError::NotWritable(folder.to_path_buf())
    } else {
        DestinationError::Io(err)
    }
}

/// Create the folder if needed and write the marker file into it.
pub fn write_marker(folder: &Path) -> Result<PathBuf, DestinationError> {
    fs::create_dir_all(folder).map_err(|e| not_writable_or_io(folder, e))?;
    let marker = folder.join(MARKER_FILE);
    fs::write(&marker, "").map_err(|e| not_writable_or_io(folder, e))?;
    Ok(marker)
}

/// Remove every top-level entry of `folder` except preserved names and
/// dot-files.
///
/// Returns `true` only if every removal succeeded. A missing folder counts
/// as cleared.
pub fn clear_folder(folder: &Path, preserve: &[String]) -> bool {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
        Err(e) => {
            tracing::warn!(path = %folder.display(), error = %e, "Failed to list output folder");
            return false;
        }
    };

    let mut cleared = true;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %folder.display(), error = %e, "Failed to read entry");
                cleared = false;
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || preserve.iter().any(|p| *p == name) {
            tracing::debug!(name = %name, "Preserved");
            continue;
        }

        let path = entry.path();
        let result = match entry.file_type() {
            Ok(kind) if kind.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove");
            cleared = false;
        }
    }
    cleared
}

/// Write a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Copy a file, creating parent directories as needed. Existing targets are
/// overwritten.
pub fn copy_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

/// Copy a directory tree. Returns every copied file, in sorted walk order.
pub fn copy_dir(source: &Path, target: &Path) -> io::Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            copy_file(entry.path(), &destination)?;
            copied.push(destination);
        }
    }
    Ok(copied)
}

fn top_level_names(folder: &Path) -> io::Result<Vec<String>> {
    match fs::read_dir(folder) {
        Ok(entries) => entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

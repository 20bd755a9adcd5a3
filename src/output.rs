//! Reporting a run to its caller.
//!
//! # Run Report
//!
//! [`GenerationReport`] is what an invocation wrapper (an admin endpoint, a
//! command) hands back: whether the run succeeded, every file it wrote, and
//! a one-line message. It serializes as
//!
//! ```text
//! { "success": true, "files": ["/srv/site/static/index.html", …],
//!   "message": "42 files generated / copied" }
//! ```
//!
//! A failed run carries no files and the error text as message.
//!
//! # Text Output
//!
//! ```text
//! 001 index.html
//! 002 about/index.html
//! 003 media/pages/about/team.jpg
//!
//! 3 files generated / copied
//! ```
//!
//! Paths are shown relative to the output folder. Each stage has a
//! `format_*` function (returns `Vec<String>`) for testability and a `print_*`
//! wrapper that writes to stdout.

use crate::generate::GenerateError;
use crate::types::FileList;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub success: bool,
    pub files: Vec<PathBuf>,
    pub message: String,
}

impl GenerationReport {
    pub fn from_files(files: &FileList) -> Self {
        Self {
            success: true,
            files: files.as_slice().to_vec(),
            message: files_message(files.len()),
        }
    }

    pub fn failure(error: &GenerateError) -> Self {
        Self {
            success: false,
            files: Vec::new(),
            message: error.to_string(),
        }
    }

    /// Report for the result of a run.
    pub fn from_result(result: &Result<FileList, GenerateError>) -> Self {
        match result {
            Ok(files) => Self::from_files(files),
            Err(e) => Self::failure(e),
        }
    }
}

fn files_message(count: usize) -> String {
    format!("{count} files generated / copied")
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Format the files of a run, in write order, relative to `output_folder`.
pub fn format_generate_output(files: &FileList, output_folder: &Path) -> Vec<String> {
    let mut lines: Vec<String> = files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let shown = path.strip_prefix(output_folder).unwrap_or(path);
            format!("{} {}", format_index(i + 1), shown.display())
        })
        .collect();

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(files_message(files.len()));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(files: &FileList, output_folder: &Path) {
    for line in format_generate_output(files, output_folder) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::DestinationError;

    fn files(out: &Path, names: &[&str]) -> FileList {
        let mut list = FileList::new();
        list.extend(names.iter().map(|n| out.join(n)));
        list
    }

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn report_counts_files() {
        let out = Path::new("/srv/site/static");
        let report = GenerationReport::from_files(&files(out, &["index.html", "about/index.html"]));

        assert!(report.success);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.message, "2 files generated / copied");
    }

    #[test]
    fn failure_report_carries_error_text() {
        let error = GenerateError::UnsafeOverwrite(DestinationError::UnsafeOverwrite(
            PathBuf::from("/home/me/documents"),
        ));
        let report = GenerationReport::from_result(&Err(error));

        assert!(!report.success);
        assert!(report.files.is_empty());
        assert!(report.message.contains("/home/me/documents"));
    }

    #[test]
    fn report_serializes_to_caller_shape() {
        let out = Path::new("/out");
        let report = GenerationReport::from_files(&files(out, &["index.html"]));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "files": ["/out/index.html"],
                "message": "1 files generated / copied"
            })
        );
    }

    #[test]
    fn generate_output_is_relative_to_output_folder() {
        let out = Path::new("/srv/site/static");
        let lines = format_generate_output(
            &files(out, &["index.html", "blog/index.html", "media/a.jpg"]),
            out,
        );

        assert_eq!(
            lines,
            vec![
                "001 index.html",
                "002 blog/index.html",
                "003 media/a.jpg",
                "",
                "3 files generated / copied",
            ]
        );
    }

    #[test]
    fn generate_output_for_empty_run() {
        let lines = format_generate_output(&FileList::new(), Path::new("/out"));
        assert_eq!(lines, vec!["0 files generated / copied"]);
    }
}

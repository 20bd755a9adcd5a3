//! # Sitefreeze
//!
//! Freezes a content-managed site into a directory of static files that can be
//! hosted without a server runtime. The CMS stays in charge of content and
//! rendering; this crate drives it page by page, makes the output portable and
//! lays it out on disk.
//!
//! # Architecture: One Sequential Run
//!
//! A generation run is a single, synchronous pass over the site:
//!
//! ```text
//! Preparing            check + mark + clear the output folder
//! RenderingHome        home page → <output>/index.html
//! RenderingLanguages   every page, once per language
//! RenderingCustomRoutes  operator-declared extra outputs
//! CopyingMedia         files templates referenced while rendering
//! CopyingPluginAssets  plugin assets under <media>/plugins/<name>/
//! CopyingPaths         extra folders/files (e.g. the site's assets/)
//! ```
//!
//! Render context (language, request URL, cache scope) is global mutable state
//! inside most CMS hosts, so the run never parallelizes across pages. Instead
//! each render receives an explicit [`host::RenderContext`] value built fresh
//! for that page and language.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`host`] | The CMS collaborator: page tree, languages, URLs, rendering |
//! | [`config`] | Layered `sitefreeze.toml` loading, validation and resolution |
//! | [`paths`] | Relative path resolution and output path cleaning |
//! | [`destination`] | Output folder safety check, marker file, clearing, copying |
//! | [`rewrite`] | Base-URL substitution across plain, JSON and HTML-entity encodings |
//! | [`media`] | Media references collected during rendering |
//! | [`trap`] | Converts panics inside the host into reportable errors |
//! | [`routes`] | Custom route resolution |
//! | [`assets`] | Media, plugin asset and extra path copying |
//! | [`generate`] | The page crawler and run state machine |
//! | [`output`] | Caller-facing run report and text summary |
//! | [`types`] | Shared value types (`FileList`, `PageTask`, `MediaRecord`) |
//!
//! # Design Decisions
//!
//! ## Full Regeneration Only
//!
//! Every run clears the output folder and writes everything again. Names on
//! the preserve list and dot-files survive. There is no incremental mode: a
//! CMS page can depend on any other page, so the only safe invalidation unit
//! is the whole site.
//!
//! ## Refusing Foreign Folders
//!
//! Clearing is destructive, so a non-empty output folder must already look
//! like ours (it holds the `.sitefreeze` marker or an index file) before
//! anything is removed.
//!
//! ## Placeholder Base URL
//!
//! Templates that build absolute URLs need a non-empty base. When the host has
//! none, the run renders against `https://sitefreeze-base-url` and scrubs it
//! from every output in all the encodings a template may emit it in.

pub mod assets;
pub mod config;
pub mod destination;
pub mod generate;
pub mod host;
pub mod media;
pub mod output;
pub mod paths;
pub mod rewrite;
pub mod routes;
pub mod trap;
pub mod types;

pub use generate::{GenerateError, Generator, generate, generate_from_config};
pub use types::FileList;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Custom route expansion.
//!
//! A custom route names an output path and where its content comes from.
//! Sources are tried in order:
//!
//! 1. `page`: an existing page, rendered normally at `path`
//! 2. `content`: a literal body, written after URL rewriting
//! 3. `route` (or `path` itself): dispatched through the host's router,
//!    which may answer with a page, a response body, or nothing
//!
//! A route that resolves to nothing produces no output and is not an error.

use crate::config::CustomRoute;
use crate::host::{Host, Page, RenderContext, RouteResult};
use crate::paths::PathCleaner;
use crate::types::PageTask;
use std::path::Path;

/// Where a custom route's output comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteSource {
    Page(Page),
    Content(String),
}

/// Resolve a route to its source, or `None` when there is nothing to write.
pub fn resolve_route<H: Host + ?Sized>(
    host: &H,
    route: &CustomRoute,
    context: &RenderContext<'_>,
) -> Option<RouteSource> {
    if route.path.trim().is_empty() {
        return None;
    }

    if let Some(page) = route.page.as_deref().and_then(|id| host.find_page(id)) {
        return Some(RouteSource::Page(page));
    }

    if let Some(content) = &route.content {
        return Some(RouteSource::Content(content.clone()));
    }

    let pattern = route
        .route
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(&route.path);
    match host.dispatch(pattern, context) {
        RouteResult::Page(page) => Some(RouteSource::Page(page)),
        RouteResult::Body(body) => Some(RouteSource::Content(body)),
        RouteResult::None => None,
    }
}

/// Build the page task for a resolved route.
///
/// Literal content gets a synthetic page identity numbered by the route's
/// position, so repeated runs produce the same identities.
pub fn route_task(
    route: &CustomRoute,
    source: RouteSource,
    position: usize,
    output_folder: &Path,
    cleaner: &PathCleaner,
    default_base_url: &str,
) -> PageTask {
    let (page, content) = match source {
        RouteSource::Page(page) => (page, None),
        RouteSource::Content(body) => (Page::synthetic(format!("custom-route/{position}")), Some(body)),
    };
    let base_url = route
        .base_url
        .as_deref()
        .map(|b| b.trim_end_matches('/'))
        .unwrap_or(default_base_url);

    let mut task = PageTask::new(
        page,
        route.language_code.clone(),
        cleaner.page_file(output_folder, &route.path),
        base_url,
    );
    task.data = route.data.clone();
    task.content = content;
    task
}

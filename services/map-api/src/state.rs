//! Application state shared by all handlers.

use std::sync::Arc;

use boundaries::JoinedTable;
use renderer::ChoroplethRenderer;

use crate::cache::RenderCache;

/// Immutable after startup; handlers only read it.
#[derive(Debug)]
pub struct AppState {
    /// Joined and filtered state records.
    pub table: Arc<JoinedTable>,

    pub renderer: Arc<ChoroplethRenderer>,

    /// Fingerprint of `table`, the cache key.
    pub fingerprint: u64,

    /// Present when rendered images are reused across requests.
    pub cache: Option<RenderCache>,
}

impl AppState {
    pub fn new(table: JoinedTable, renderer: ChoroplethRenderer, cache: bool) -> Self {
        let fingerprint = table.fingerprint();
        Self {
            table: Arc::new(table),
            renderer: Arc::new(renderer),
            fingerprint,
            cache: cache.then(RenderCache::new),
        }
    }

    /// Map title, used for the page heading.
    pub fn title(&self) -> &str {
        &self.renderer.options().title
    }
}

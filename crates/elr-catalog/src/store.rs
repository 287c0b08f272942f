//! Atomically replaceable catalog handle.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::catalog::Catalog;

/// Holds the current [`Catalog`] behind an [`ArcSwap`].
///
/// Readers take a snapshot with [`load`](Self::load) and keep using it for
/// the whole translation; [`replace`](Self::replace) publishes a new catalog
/// without disturbing snapshots already handed out.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<ArcSwap<Catalog>>,
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(catalog)),
        }
    }

    /// Snapshot of the current catalog.
    pub fn load(&self) -> Arc<Catalog> {
        self.inner.load_full()
    }

    /// Publishes `catalog`, returning the one it replaced.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let summary = catalog.summary();
        let previous = self.inner.swap(Arc::new(catalog));
        info!(
            schemas = summary.schemas,
            receivers = summary.receivers,
            "catalog replaced"
        );
        previous
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Catalog::empty())
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CatalogStore").field(&*self.load()).finish()
    }
}

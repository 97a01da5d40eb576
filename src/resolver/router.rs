use std::sync::Arc;

use tracing::debug;

use crate::identity::{Namespace, NamespaceMarker, WalletName};
use crate::providers::NamespaceAdapter;

/// Ordered `(marker, adapter)` table. Sigils are always matched before
/// suffixes and anything unmatched goes to the catch-all adapter.
pub struct DispatchRouter {
    routes: Vec<(NamespaceMarker, Arc<dyn NamespaceAdapter>)>,
    catch_all: Arc<dyn NamespaceAdapter>,
}

impl DispatchRouter {
    pub fn new(catch_all: Arc<dyn NamespaceAdapter>) -> Self {
        let router = Self {
            routes: Vec::new(),
            catch_all: catch_all.clone(),
        };
        router.with(catch_all)
    }

    /// Registers every marker the adapter claims. The first adapter to
    /// claim a marker keeps it.
    pub fn with(mut self, adapter: Arc<dyn NamespaceAdapter>) -> Self {
        for marker in adapter.markers() {
            if self.routes.iter().any(|(existing, _)| *existing == marker) {
                debug!(?marker, namespace = %adapter.namespace(), "Marker already routed");
                continue;
            }
            let position = if marker.is_sigil() {
                self.routes
                    .iter()
                    .position(|(existing, _)| !existing.is_sigil())
                    .unwrap_or(self.routes.len())
            } else {
                self.routes.len()
            };
            self.routes.insert(position, (marker, adapter.clone()));
        }
        self
    }

    pub fn route(&self, name: &WalletName) -> &Arc<dyn NamespaceAdapter> {
        let adapter = self
            .routes
            .iter()
            .find(|(marker, _)| marker == name.marker())
            .map(|(_, adapter)| adapter)
            .unwrap_or(&self.catch_all);
        debug!(name = %name, namespace = %adapter.namespace(), "Routed wallet name");
        adapter
    }

    pub fn catch_all(&self) -> &Arc<dyn NamespaceAdapter> {
        &self.catch_all
    }

    pub fn is_catch_all(&self, adapter: &Arc<dyn NamespaceAdapter>) -> bool {
        adapter.namespace() == self.catch_all.namespace()
    }

    /// The adapter serving `namespace`, if one is registered.
    pub fn adapter(&self, namespace: Namespace) -> Option<&Arc<dyn NamespaceAdapter>> {
        if self.catch_all.namespace() == namespace {
            return Some(&self.catch_all);
        }
        self.routes
            .iter()
            .map(|(_, adapter)| adapter)
            .find(|adapter| adapter.namespace() == namespace)
    }

    pub fn markers(&self) -> impl Iterator<Item = &NamespaceMarker> {
        self.routes.iter().map(|(marker, _)| marker)
    }
}

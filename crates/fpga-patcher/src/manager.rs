//! PatcherManager — one `Patcher` per Kubernetes namespace.
//!
//! `AcceleratorFunction` and `FpgaRegion` objects are namespaced, and a pod
//! may only use the ones registered in its own namespace.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use json_patch::Patch;
use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use crate::error::PatcherResult;
use crate::registry::Patcher;

#[derive(Debug, Default)]
pub struct PatcherManager {
    /// namespace → patcher. Patchers are never dropped once created.
    patchers: RwLock<HashMap<String, Arc<Patcher>>>,
}

impl PatcherManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The patcher for `namespace`, created empty on first use.
    pub fn patcher(&self, namespace: &str) -> Arc<Patcher> {
        {
            let patchers = self.patchers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(patcher) = patchers.get(namespace) {
                return Arc::clone(patcher);
            }
        }

        let mut patchers = self.patchers.write().unwrap_or_else(PoisonError::into_inner);
        let patcher = patchers.entry(namespace.to_string()).or_insert_with(|| {
            debug!(%namespace, "patcher created");
            Arc::new(Patcher::new(namespace))
        });
        Arc::clone(patcher)
    }

    /// Namespaces that have a patcher, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let patchers = self.patchers.read().unwrap_or_else(PoisonError::into_inner);
        let mut namespaces: Vec<_> = patchers.keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    /// Patch for a pod created in `namespace`.
    pub fn mutate_pod(&self, namespace: &str, pod: &Pod) -> PatcherResult<Patch> {
        self.patcher(namespace).mutate_pod(pod)
    }
}

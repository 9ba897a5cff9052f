//! Patcher — the resource registry for one namespace.
//!
//! Holds the virtual → concrete resource mapping, the mode of every virtual
//! resource, the function snapshots needed to program regions, and the
//! identity reference counts that let already-resolved resources pass
//! through untouched.
//!
//! All tables live behind a single `Mutex`. Mutators are called by the
//! function and region reconcilers, readers by concurrent admission
//! requests; each public operation holds the lock only for its map access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fpga_core::naming::{af_resource_name, region_resource_name, virtual_resource_name};
use fpga_core::{AcceleratorFunction, FpgaRegion, Mode, afu_dev_type};
use tracing::{debug, warn};

use crate::error::{PatcherError, PatcherResult};

/// Which reconciler registered a mapping.
#[derive(Debug, Clone)]
pub(crate) enum Origin {
    /// Immutable snapshot; updates replace the `Arc`, never the contents.
    Function(Arc<AcceleratorFunction>),
    Region,
}

/// One virtual resource: its concrete name, mode and origin.
#[derive(Debug, Clone)]
pub(crate) struct Mapping {
    pub(crate) concrete: String,
    pub(crate) mode: Mode,
    pub(crate) origin: Origin,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    /// Virtual name → mapping. Mode lives in the same entry, so the
    /// mapping and mode key sets cannot diverge.
    pub(crate) mappings: HashMap<String, Mapping>,
    /// Concrete name → number of virtual names mapped onto it. Always > 0.
    pub(crate) identities: HashMap<String, usize>,
}

impl Tables {
    fn inc_identity(&mut self, concrete: &str) {
        *self.identities.entry(concrete.to_string()).or_insert(0) += 1;
    }

    fn dec_identity(&mut self, concrete: &str) {
        match self.identities.get_mut(concrete) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.identities.remove(concrete);
            }
            None => {}
        }
    }

    fn insert(&mut self, virtual_name: String, mapping: Mapping) {
        self.inc_identity(&mapping.concrete);
        if let Some(previous) = self.mappings.insert(virtual_name, mapping) {
            self.dec_identity(&previous.concrete);
        }
    }

    fn remove_if(&mut self, virtual_name: &str, owned: impl Fn(&Origin) -> bool) -> bool {
        let Some(mapping) = self.mappings.get(virtual_name) else {
            return false;
        };
        if !owned(&mapping.origin) {
            return false;
        }
        if let Some(mapping) = self.mappings.remove(virtual_name) {
            self.dec_identity(&mapping.concrete);
        }
        true
    }
}

/// Resource registry and patch generator for one namespace.
#[derive(Debug)]
pub struct Patcher {
    namespace: String,
    tables: Mutex<Tables>,
}

impl Patcher {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every critical section leaves the tables consistent before it can
    /// panic, so a poisoned lock is still safe to use.
    pub(crate) fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register or update an accelerator function.
    ///
    /// In `af` mode the device type is resolved from the function's ids; on
    /// failure nothing changes and any previous registration stays in place.
    pub fn add_function(&self, function: &AcceleratorFunction) -> PatcherResult<()> {
        let spec = &function.spec;
        let concrete = match spec.mode {
            Mode::Af => {
                let dev_type = afu_dev_type(&spec.interface_id, &spec.afu_id).map_err(|source| {
                    warn!(
                        namespace = %self.namespace,
                        name = %function.name(),
                        error = %source,
                        "rejecting accelerator function"
                    );
                    PatcherError::DeviceTypeResolution {
                        name: function.name().to_string(),
                        source,
                    }
                })?;
                af_resource_name(&dev_type)
            }
            Mode::Region | Mode::RegionDevel => region_resource_name(&spec.interface_id),
        };

        let virtual_name = virtual_resource_name(function.name());
        debug!(
            namespace = %self.namespace,
            %virtual_name,
            %concrete,
            mode = %spec.mode,
            "accelerator function registered"
        );

        self.tables().insert(
            virtual_name,
            Mapping {
                concrete,
                mode: spec.mode,
                origin: Origin::Function(Arc::new(function.clone())),
            },
        );
        Ok(())
    }

    /// Register or update a region. Regions are always `regiondevel`.
    pub fn add_region(&self, region: &FpgaRegion) {
        let virtual_name = virtual_resource_name(region.name());
        let concrete = region_resource_name(&region.spec.interface_id);
        debug!(namespace = %self.namespace, %virtual_name, %concrete, "fpga region registered");

        self.tables().insert(
            virtual_name,
            Mapping {
                concrete,
                mode: Mode::RegionDevel,
                origin: Origin::Region,
            },
        );
    }

    /// Unregister a function. Names not registered as functions are ignored.
    pub fn remove_function(&self, name: &str) {
        let virtual_name = virtual_resource_name(name);
        let removed = self
            .tables()
            .remove_if(&virtual_name, |origin| matches!(origin, Origin::Function(_)));
        debug!(namespace = %self.namespace, %virtual_name, removed, "accelerator function removed");
    }

    /// Unregister a region. Names not registered as regions are ignored.
    pub fn remove_region(&self, name: &str) {
        let virtual_name = virtual_resource_name(name);
        let removed = self
            .tables()
            .remove_if(&virtual_name, |origin| matches!(origin, Origin::Region));
        debug!(namespace = %self.namespace, %virtual_name, removed, "fpga region removed");
    }

    /// Concrete name and mode a virtual resource resolves to.
    pub fn resolve(&self, virtual_name: &str) -> Option<(String, Mode)> {
        self.tables()
            .mappings
            .get(virtual_name)
            .map(|mapping| (mapping.concrete.clone(), mapping.mode))
    }

    /// Number of virtual resources currently mapped onto `concrete`.
    pub fn identity_count(&self, concrete: &str) -> usize {
        self.tables().identities.get(concrete).copied().unwrap_or(0)
    }

    /// Number of registered virtual resources.
    pub fn len(&self) -> usize {
        self.tables().mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

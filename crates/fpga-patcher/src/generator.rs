//! Patch generation — rewrites a container's virtual FPGA resources.
//!
//! For each container the generator:
//! 1. drops env variables reserved for the CRI hook (on a private copy),
//! 2. collects the governed resource requests,
//! 3. resolves every virtual name through the registry, enforcing that all
//!    resources of a container are operated in the same mode,
//! 4. emits `remove` for every virtual resource, then `add` for every
//!    concrete resource with the summed quantity,
//! 5. in `region` mode, replaces the env list with one that tells the CRI
//!    hook which interface/AFU pair to program for each requested region.
//!
//! Resources already carrying a concrete name resolve to themselves, which
//! keeps the webhook idempotent on pods it has already mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use fpga_core::{AcceleratorFunction, Mode};
use json_patch::{Patch, PatchOperation};
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod};
use tracing::{debug, trace};

use crate::error::{PatcherError, PatcherResult};
use crate::ops::{self, ResourceSection};
use crate::registry::{Origin, Patcher};
use crate::resources::{requested_resources, sanitized_env};

/// Upper bound on `FPGA_REGION_<n>`/`FPGA_AFU_<n>` pairs per container.
pub const MAX_REGION_UNITS: i64 = 256;

/// A `region` mode allocation: which function to program and how often.
struct RegionAllocation {
    function: Arc<AcceleratorFunction>,
    count: i64,
}

impl Patcher {
    /// Patch operations for the container at `container_idx`.
    ///
    /// Order: removals of virtual resources, additions of concrete
    /// resources, then the optional env replacement. Registry state is only
    /// read.
    pub fn patch_ops(&self, container_idx: usize, container: &Container) -> PatcherResult<Vec<PatchOperation>> {
        let env = sanitized_env(container);
        let requested = requested_resources(container)?;
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let mut container_mode: Option<Mode> = None;
        let mut resources: BTreeMap<String, i64> = BTreeMap::new();
        let mut allocations = Vec::new();
        let mut region_units: i64 = 0;
        let mut ops = Vec::with_capacity(2 * requested.len());

        {
            let tables = self.tables();
            for (rname, &quantity) in &requested {
                let Some(mapping) = tables.mappings.get(rname) else {
                    if tables.identities.contains_key(rname) {
                        trace!(namespace = %self.namespace(), resource = %rname, "resource resolves to itself");
                        continue;
                    }
                    return Err(PatcherError::UnknownResource(rname.clone()));
                };

                match container_mode {
                    None => container_mode = Some(mapping.mode),
                    Some(expected) if expected != mapping.mode => {
                        return Err(PatcherError::ModeConflict {
                            resource: rname.clone(),
                            expected,
                            found: mapping.mode,
                        });
                    }
                    Some(_) => {}
                }

                // In `af` and `regiondevel` mode the plugin advertises the
                // concrete resource directly; only `region` needs the hook.
                if mapping.mode == Mode::Region {
                    if let Origin::Function(function) = &mapping.origin {
                        region_units = region_units.saturating_add(quantity);
                        if region_units > MAX_REGION_UNITS {
                            return Err(PatcherError::TooManyRegionUnits {
                                requested: region_units,
                                limit: MAX_REGION_UNITS,
                            });
                        }
                        allocations.push(RegionAllocation {
                            function: Arc::clone(function),
                            count: quantity,
                        });
                    }
                }

                let total = resources.entry(mapping.concrete.clone()).or_insert(0);
                *total = total
                    .checked_add(quantity)
                    .ok_or_else(|| PatcherError::QuantityOverflow(mapping.concrete.clone()))?;

                for section in ResourceSection::BOTH {
                    ops.push(ops::remove_resource(container_idx, section, rname));
                }
            }
        }

        for (resource, &quantity) in &resources {
            for section in ResourceSection::BOTH {
                ops.push(ops::add_resource(container_idx, section, resource, quantity));
            }
        }

        let programmed = region_env(&allocations);
        if !programmed.is_empty() {
            let merged: Vec<EnvVar> = env.into_iter().chain(programmed).collect();
            let value = serde_json::to_value(&merged)?;
            ops.push(ops::replace_env(container_idx, value));
        }

        debug!(
            namespace = %self.namespace(),
            container = %container.name,
            ops = ops.len(),
            "container patch generated"
        );
        Ok(ops)
    }

    /// Patch for every container of `pod`, or the first error.
    ///
    /// An empty patch means the pod needs no changes.
    pub fn mutate_pod(&self, pod: &Pod) -> PatcherResult<Patch> {
        let containers = pod
            .spec
            .as_ref()
            .map(|spec| spec.containers.as_slice())
            .unwrap_or_default();

        let mut ops = Vec::new();
        for (idx, container) in containers.iter().enumerate() {
            ops.extend(self.patch_ops(idx, container)?);
        }
        Ok(Patch(ops))
    }
}

/// `FPGA_REGION_<n>`/`FPGA_AFU_<n>` pairs, one per requested region unit.
fn region_env(allocations: &[RegionAllocation]) -> Vec<EnvVar> {
    let var = |name: String, value: &str| EnvVar {
        name,
        value: Some(value.to_string()),
        ..Default::default()
    };

    let mut env = Vec::new();
    let mut counter = 0;
    for allocation in allocations {
        let spec = &allocation.function.spec;
        for _ in 0..allocation.count {
            counter += 1;
            env.push(var(format!("FPGA_REGION_{counter}"), &spec.interface_id));
            env.push(var(format!("FPGA_AFU_{counter}"), &spec.afu_id));
        }
    }
    env
}

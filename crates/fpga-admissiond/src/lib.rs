//! Startup helpers for the FPGA admission daemon.

use fpga_core::AdmissionConfig;
use fpga_patcher::PatcherManager;
use tracing::{info, warn};

/// Outcome of registering the statically configured objects.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub functions: usize,
    pub regions: usize,
    /// Functions whose device type could not be resolved.
    pub rejected: Vec<String>,
}

/// Register the functions and regions listed in `config`.
///
/// A function that fails to resolve is logged and skipped; it does not stop
/// the daemon from starting.
pub fn seed_registry(manager: &PatcherManager, config: &AdmissionConfig) -> SeedReport {
    let mut report = SeedReport::default();

    for entry in &config.functions {
        let function = entry.to_function();
        match manager.patcher(&entry.namespace).add_function(&function) {
            Ok(()) => report.functions += 1,
            Err(e) => {
                warn!(namespace = %entry.namespace, name = %entry.name, error = %e, "skipping configured function");
                report.rejected.push(format!("{}/{}", entry.namespace, entry.name));
            }
        }
    }

    for entry in &config.regions {
        manager.patcher(&entry.namespace).add_region(&entry.to_region());
        report.regions += 1;
    }

    info!(
        functions = report.functions,
        regions = report.regions,
        rejected = report.rejected.len(),
        "registry seeded from config"
    );
    report
}

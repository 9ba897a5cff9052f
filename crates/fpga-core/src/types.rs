//! Custom resources observed by the FPGA admission controller.
//!
//! These mirror the `fpga.intel.com/v2` CRDs closely enough to deserialize
//! the objects a reconciler hands over; unknown fields are ignored.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// How the FPGA device plugin exposes the resource a function maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The plugin advertises pre-programmed accelerator functions.
    Af,
    /// The plugin advertises regions; the CRI hook programs the function.
    Region,
    /// The plugin advertises regions and the workload programs them itself.
    RegionDevel,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Af => "af",
            Mode::Region => "region",
            Mode::RegionDevel => "regiondevel",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── AcceleratorFunction ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorFunctionSpec {
    /// Hex-encoded AFU id.
    pub afu_id: String,
    /// Hex-encoded interface id of the region the AFU fits into.
    pub interface_id: String,
    pub mode: Mode,
}

/// A reconfigurable accelerator function registered in a namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorFunction {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: AcceleratorFunctionSpec,
}

impl AcceleratorFunction {
    pub fn new(name: &str, spec: AcceleratorFunctionSpec) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec,
        }
    }

    /// Object name, empty when the metadata carries none.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

// ── FpgaRegion ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FpgaRegionSpec {
    /// Hex-encoded interface id of the region.
    pub interface_id: String,
}

/// An FPGA region workloads may program themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FpgaRegion {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: FpgaRegionSpec,
}

impl FpgaRegion {
    pub fn new(name: &str, interface_id: &str) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: FpgaRegionSpec {
                interface_id: interface_id.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }
}

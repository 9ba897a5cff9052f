//! Typed JSON Patch operations against a pod spec.
//!
//! Values are carried as `serde_json::Value` and serialized by `json_patch`,
//! so nothing user-supplied is ever spliced into JSON text.

use fpga_core::naming::escape_pointer_token;
use json_patch::{AddOperation, PatchOperation, RemoveOperation};
use serde_json::Value;

/// Section of a container's resource requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSection {
    Limits,
    Requests,
}

impl ResourceSection {
    pub const BOTH: [ResourceSection; 2] = [ResourceSection::Limits, ResourceSection::Requests];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceSection::Limits => "limits",
            ResourceSection::Requests => "requests",
        }
    }
}

pub fn resource_path(container_idx: usize, section: ResourceSection, resource: &str) -> String {
    format!(
        "/spec/containers/{container_idx}/resources/{}/{}",
        section.as_str(),
        escape_pointer_token(resource)
    )
}

pub fn env_path(container_idx: usize) -> String {
    format!("/spec/containers/{container_idx}/env")
}

pub fn remove_resource(container_idx: usize, section: ResourceSection, resource: &str) -> PatchOperation {
    PatchOperation::Remove(RemoveOperation {
        path: resource_path(container_idx, section, resource),
    })
}

/// Add `resource` with a whole quantity, rendered the way the API server
/// renders quantities (a JSON string).
pub fn add_resource(
    container_idx: usize,
    section: ResourceSection,
    resource: &str,
    quantity: i64,
) -> PatchOperation {
    PatchOperation::Add(AddOperation {
        path: resource_path(container_idx, section, resource),
        value: Value::String(quantity.to_string()),
    })
}

/// Replace the whole env list of a container.
pub fn replace_env(container_idx: usize, env: Value) -> PatchOperation {
    PatchOperation::Add(AddOperation {
        path: env_path(container_idx),
        value: env,
    })
}

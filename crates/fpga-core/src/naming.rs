//! Extended resource names and JSON pointer escaping.

/// Namespace of every extended resource the admission controller governs.
pub const RESOURCE_NAMESPACE: &str = "fpga.intel.com";

/// Prefix a container resource name must carry to be governed.
pub const RESOURCE_PREFIX: &str = "fpga.intel.com/";

/// Env variable prefixes reserved for the CRI hook.
pub const RESERVED_ENV_PREFIXES: [&str; 2] = ["FPGA_REGION", "FPGA_AFU"];

/// Name a workload requests for a function or region object.
pub fn virtual_resource_name(object_name: &str) -> String {
    format!("{RESOURCE_NAMESPACE}/{object_name}")
}

/// Name the device plugin advertises for a region with the given interface.
pub fn region_resource_name(interface_id: &str) -> String {
    format!("{RESOURCE_NAMESPACE}/region-{interface_id}")
}

/// Name the device plugin advertises for an AFU device type.
pub fn af_resource_name(dev_type: &str) -> String {
    format!("{RESOURCE_NAMESPACE}/{dev_type}")
}

pub fn is_governed(resource_name: &str) -> bool {
    resource_name.starts_with(RESOURCE_PREFIX)
}

pub fn is_reserved_env(name: &str) -> bool {
    RESERVED_ENV_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Escape one JSON pointer reference token (RFC 6901).
pub fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

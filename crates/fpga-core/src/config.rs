//! fpga-admission.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{AcceleratorFunction, AcceleratorFunctionSpec, FpgaRegion, Mode};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdmissionConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Functions registered before any reconciler reports in.
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
    #[serde(default)]
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8443
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEntry {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    pub interface_id: String,
    pub afu_id: String,
    pub mode: Mode,
}

impl FunctionEntry {
    pub fn to_function(&self) -> AcceleratorFunction {
        let mut function = AcceleratorFunction::new(
            &self.name,
            AcceleratorFunctionSpec {
                afu_id: self.afu_id.clone(),
                interface_id: self.interface_id.clone(),
                mode: self.mode,
            },
        );
        function.metadata.namespace = Some(self.namespace.clone());
        function
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionEntry {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    pub interface_id: String,
}

impl RegionEntry {
    pub fn to_region(&self) -> FpgaRegion {
        let mut region = FpgaRegion::new(&self.name, &self.interface_id);
        region.metadata.namespace = Some(self.namespace.clone());
        region
    }
}

impl AdmissionConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AdmissionConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let config: AdmissionConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8443);
        assert!(config.functions.is_empty());
        assert!(config.regions.is_empty());
    }

    #[test]
    fn test_parse_seeds() {
        let toml_str = r#"
[server]
port = 9443

[[functions]]
name = "arria10.dcp1.2-nlb0-preprogrammed"
interface_id = "69528db6eb31577a8c3668f9faa081f6"
afu_id = "d8424dc4a4a3c413f89e433683f9040b"
mode = "af"

[[regions]]
namespace = "fpga-jobs"
name = "arria10.dcp1.2"
interface_id = "69528db6eb31577a8c3668f9faa081f6"
"#;
        let config: AdmissionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9443);

        let function = config.functions[0].to_function();
        assert_eq!(function.name(), "arria10.dcp1.2-nlb0-preprogrammed");
        assert_eq!(function.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(function.spec.mode, Mode::Af);

        let region = config.regions[0].to_region();
        assert_eq!(region.metadata.namespace.as_deref(), Some("fpga-jobs"));
        assert_eq!(region.spec.interface_id, "69528db6eb31577a8c3668f9faa081f6");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let toml_str = r#"
[[functions]]
name = "x"
interface_id = "69528db6eb31577a8c3668f9faa081f6"
afu_id = "d8424dc4a4a3c413f89e433683f9040b"
mode = "bitstream"
"#;
        assert!(toml::from_str::<AdmissionConfig>(toml_str).is_err());
    }
}

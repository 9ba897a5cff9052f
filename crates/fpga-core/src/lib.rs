pub mod config;
pub mod devtype;
pub mod naming;
pub mod types;

pub use config::AdmissionConfig;
pub use devtype::{DevTypeError, afu_dev_type};
pub use types::*;

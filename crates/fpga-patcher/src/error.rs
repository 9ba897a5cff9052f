//! Error types for registration and patch generation.

use fpga_core::{DevTypeError, Mode};
use thiserror::Error;

/// Result type alias for patcher operations.
pub type PatcherResult<T> = Result<T, PatcherError>;

/// Errors returned by registry mutators and patch generation.
///
/// None of these are transient: the caller either reports them on the
/// owning object or denies the pod.
#[derive(Debug, Error)]
pub enum PatcherError {
    #[error("unable to resolve device type of {name:?}: {source}")]
    DeviceTypeResolution {
        name: String,
        #[source]
        source: DevTypeError,
    },

    #[error("no such resource: {0:?}")]
    UnknownResource(String),

    #[error(
        "container cannot be scheduled as it requires resources operated in different modes: \
         {resource:?} is {found}, others are {expected}"
    )]
    ModeConflict {
        resource: String,
        expected: Mode,
        found: Mode,
    },

    #[error(
        "'limits' and 'requests' for {0:?} must be equal as extended resources cannot be overcommitted"
    )]
    ResourceMismatch(String),

    #[error("resource quantity {quantity:?} isn't of integral type for {resource:?}")]
    NonIntegralQuantity { resource: String, quantity: String },

    #[error("total quantity requested for {0:?} is out of range")]
    QuantityOverflow(String),

    #[error("container requests {requested} region programmings, at most {limit} are supported")]
    TooManyRegionUnits { requested: i64, limit: i64 },

    #[error("unable to serialize env patch: {0}")]
    EnvSerialization(#[from] serde_json::Error),
}

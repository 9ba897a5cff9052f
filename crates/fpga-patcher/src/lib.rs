//! fpga-patcher — resolves virtual FPGA resources into device plugin resources.
//!
//! Workloads request resources named after `AcceleratorFunction` and
//! `FpgaRegion` objects (`fpga.intel.com/<object-name>`). Device plugins
//! advertise different names, derived from the function's mode and ids.
//! This crate keeps the mapping between the two and turns a pod into the
//! JSON Patch that rewrites its containers' resources.
//!
//! # Architecture
//!
//! ```text
//! reconcilers ──add/remove──► Patcher (one per namespace, behind a Mutex)
//!                                 ▲
//! admission ──► PatcherManager ───┘ read-only: patch_ops / mutate_pod
//! ```
//!
//! # Components
//!
//! - **`registry`** — the `Patcher`: mapping table, identity reference counts
//! - **`generator`** — per-container patch operations and the pod entrypoint
//! - **`resources`** — requested-resource extraction and env sanitizing
//! - **`quantity`** — integral Kubernetes quantity parsing
//! - **`ops`** — typed JSON Patch operation builders
//! - **`manager`** — per-namespace `Patcher`s
//! - **`admission`** — `AdmissionReview` handling on top of the manager

pub mod admission;
pub mod error;
pub mod generator;
pub mod manager;
pub mod ops;
pub mod quantity;
pub mod registry;
pub mod resources;

pub use error::{PatcherError, PatcherResult};
pub use manager::PatcherManager;
pub use registry::Patcher;

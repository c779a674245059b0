//! Kernel Module Management CRD Definitions
//!
//! Kubernetes Custom Resource Definitions consumed by the module DaemonSet core.

pub mod module;

pub use module::*;

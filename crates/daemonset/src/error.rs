//! DaemonSet core error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by DaemonSet generation, lookup and garbage collection.
#[derive(Debug, Error)]
pub enum DaemonSetError {
    /// A required input was missing or empty; nothing was generated
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two module-loader DaemonSets claim the same kernel version
    #[error("multiple DaemonSets found for kernel {kernel_version:?}: {first} and {second}")]
    DuplicateKernelVersion {
        /// Kernel version claimed twice
        kernel_version: String,
        /// First DaemonSet seen
        first: String,
        /// Second DaemonSet seen
        second: String,
    },

    /// Two device-plugin DaemonSets exist for the same Module
    #[error("multiple device-plugin DaemonSets found: {first} and {second}")]
    DuplicateDevicePlugin {
        /// First DaemonSet seen
        first: String,
        /// Second DaemonSet seen
        second: String,
    },

    /// The DaemonSet is already controlled by another object
    #[error("DaemonSet {daemonset} is already owned by {owner_kind} {owner_name}")]
    AlreadyOwned {
        /// DaemonSet name
        daemonset: String,
        /// Kind of the current controller
        owner_kind: String,
        /// Name of the current controller
        owner_name: String,
    },

    /// Listing a Module's DaemonSets failed
    #[error("could not list DaemonSets for module {namespace}/{module}: {source}")]
    List {
        /// Module namespace
        namespace: String,
        /// Module name
        module: String,
        /// Store error
        #[source]
        source: StoreError,
    },

    /// Deleting a DaemonSet failed
    #[error("could not delete DaemonSet {namespace}/{name}: {source}")]
    Delete {
        /// DaemonSet namespace
        namespace: String,
        /// DaemonSet name
        name: String,
        /// Store error
        #[source]
        source: StoreError,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DaemonSetError {
    /// Whether the error signals inconsistent cluster state that callers
    /// should alert on rather than retry.
    pub fn is_consistency_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKernelVersion { .. } | Self::DuplicateDevicePlugin { .. }
        )
    }
}

//! Kernel module DaemonSets
//!
//! Builds the DaemonSets that load a [`crds::Module`] onto nodes, one
//! module-loader DaemonSet per kernel version plus an optional device-plugin
//! DaemonSet, and garbage-collects module loaders for kernels that are no
//! longer present in the cluster.
//!
//! The crate covers desired-state computation only. Watching Modules and
//! nodes and deciding when to generate or collect belongs to the caller.

pub mod command;
pub mod config;
pub mod constants;
pub mod creator;
pub mod error;
pub mod generator;
pub mod index;
pub mod kube_store;
pub mod labels;
pub mod ownership;
pub mod role;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;


pub use command::{make_load_command, make_unload_command};
pub use config::DaemonSetConfig;
pub use creator::DaemonSetCreator;
pub use error::DaemonSetError;
pub use generator::DaemonSetGenerator;
pub use index::ModuleDaemonSets;
pub use kube_store::KubeDaemonSetStore;
pub use role::{readiness_label_for, WorkloadRole};
pub use store::{DaemonSetStore, StoreError};

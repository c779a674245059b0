//! Indexing of a Module's DaemonSets by kernel version.

use crate::error::DaemonSetError;
use crate::role::WorkloadRole;
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// A Module's live DaemonSets: one module loader per kernel version and at
/// most one device plugin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDaemonSets {
    /// Module-loader DaemonSets keyed by kernel version
    pub module_loaders: BTreeMap<String, DaemonSet>,
    /// The device-plugin DaemonSet, if any
    pub device_plugin: Option<DaemonSet>,
}

impl ModuleDaemonSets {
    /// Indexes `daemonsets` by the value of `kernel_label`.
    ///
    /// Two DaemonSets with the same kernel version, or two device-plugin
    /// DaemonSets, are rejected rather than one of them being dropped.
    pub fn index(
        daemonsets: impl IntoIterator<Item = DaemonSet>,
        kernel_label: &str,
    ) -> Result<Self, DaemonSetError> {
        let mut indexed = Self::default();

        for ds in daemonsets {
            match WorkloadRole::from_labels(ds.metadata.labels.as_ref(), kernel_label) {
                WorkloadRole::ModuleLoader { kernel_version } => {
                    if let Some(first) = indexed.module_loaders.get(&kernel_version) {
                        return Err(DaemonSetError::DuplicateKernelVersion {
                            kernel_version,
                            first: first.name_any(),
                            second: ds.name_any(),
                        });
                    }
                    debug!("DaemonSet {} targets kernel {}", ds.name_any(), kernel_version);
                    indexed.module_loaders.insert(kernel_version, ds);
                }
                WorkloadRole::DevicePlugin => {
                    if let Some(first) = &indexed.device_plugin {
                        return Err(DaemonSetError::DuplicateDevicePlugin {
                            first: first.name_any(),
                            second: ds.name_any(),
                        });
                    }
                    debug!("DaemonSet {} is the device plugin", ds.name_any());
                    indexed.device_plugin = Some(ds);
                }
            }
        }

        Ok(indexed)
    }

    /// Module-loader DaemonSet for `kernel_version`.
    pub fn get(&self, kernel_version: &str) -> Option<&DaemonSet> {
        self.module_loaders.get(kernel_version)
    }

    /// Kernel versions with a module-loader DaemonSet, in order.
    pub fn kernel_versions(&self) -> impl Iterator<Item = &str> {
        self.module_loaders.keys().map(String::as_str)
    }

    /// Number of DaemonSets, the device plugin included.
    pub fn len(&self) -> usize {
        self.module_loaders.len() + usize::from(self.device_plugin.is_some())
    }

    /// Whether the Module has no DaemonSets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every DaemonSet with its role.
    pub fn iter(&self) -> impl Iterator<Item = (WorkloadRole, &DaemonSet)> {
        self.module_loaders
            .iter()
            .map(|(kv, ds)| {
                (
                    WorkloadRole::ModuleLoader {
                        kernel_version: kv.clone(),
                    },
                    ds,
                )
            })
            .chain(
                self.device_plugin
                    .iter()
                    .map(|ds| (WorkloadRole::DevicePlugin, ds)),
            )
    }
}

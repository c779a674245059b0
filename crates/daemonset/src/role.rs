//! DaemonSet roles.
//!
//! A Module produces one module-loader DaemonSet per kernel version and at
//! most one device-plugin DaemonSet. On the wire the device plugin is the
//! DaemonSet whose kernel label is absent or empty; in code it is
//! [`WorkloadRole::DevicePlugin`].

use crate::constants::{DEVICE_PLUGIN_ROLE, MODULE_LOADER_ROLE};
use crate::labels::{
    device_plugin_node_label, driver_container_node_label, is_device_plugin_kernel_version,
};
use std::collections::BTreeMap;
use std::fmt;

/// Role of a DaemonSet generated for a Module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkloadRole {
    /// Loads the module on nodes running `kernel_version`
    ModuleLoader {
        /// Full kernel version targeted
        kernel_version: String,
    },
    /// Runs the device plugin on nodes where the module is ready
    DevicePlugin,
}

impl WorkloadRole {
    /// Classifies a DaemonSet or pod from its labels.
    pub fn from_labels(labels: Option<&BTreeMap<String, String>>, kernel_label: &str) -> Self {
        match labels.and_then(|l| l.get(kernel_label)) {
            Some(kv) if !is_device_plugin_kernel_version(kv) => Self::ModuleLoader {
                kernel_version: kv.clone(),
            },
            _ => Self::DevicePlugin,
        }
    }

    /// Value of the role label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleLoader { .. } => MODULE_LOADER_ROLE,
            Self::DevicePlugin => DEVICE_PLUGIN_ROLE,
        }
    }

    /// Targeted kernel version, `None` for the device plugin.
    pub fn kernel_version(&self) -> Option<&str> {
        match self {
            Self::ModuleLoader { kernel_version } => Some(kernel_version),
            Self::DevicePlugin => None,
        }
    }

    /// Node label that signals this role is ready for `module_name`.
    pub fn readiness_label(&self, module_name: &str) -> String {
        match self {
            Self::ModuleLoader { .. } => driver_container_node_label(module_name),
            Self::DevicePlugin => device_plugin_node_label(module_name),
        }
    }
}

impl fmt::Display for WorkloadRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleLoader { kernel_version } => {
                write!(f, "{MODULE_LOADER_ROLE} ({kernel_version})")
            }
            Self::DevicePlugin => f.write_str(DEVICE_PLUGIN_ROLE),
        }
    }
}

/// Readiness node label a pod maps to, from the pod's labels.
pub fn readiness_label_for(
    pod_labels: Option<&BTreeMap<String, String>>,
    kernel_label: &str,
    module_name: &str,
) -> String {
    WorkloadRole::from_labels(pod_labels, kernel_label).readiness_label(module_name)
}

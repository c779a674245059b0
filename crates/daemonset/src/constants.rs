//! Label keys, host paths and volume names shared by the generated DaemonSets.

/// Label carrying the owning Module's name on DaemonSets and their pods.
pub const MODULE_NAME_LABEL: &str = "kmm.node.kubernetes.io/module.name";

/// Label carrying the DaemonSet role (`module-loader` or `device-plugin`).
pub const DAEMONSET_ROLE_LABEL: &str = "kmm.node.kubernetes.io/role";

/// Default label holding a node's full kernel version.
pub const DEFAULT_KERNEL_LABEL: &str = "kmm.node.kubernetes.io/kernel-version.full";

/// Finalizer placed on generated pods so the node labeler can clear
/// readiness labels before the pod goes away.
pub const NODE_LABELER_FINALIZER: &str = "kmm.node.kubernetes.io/node-labeler";

/// Prefix of the per-module node readiness labels.
pub const NODE_LABEL_PREFIX: &str = "kmm.node.kubernetes.io";

/// Role label value of module-loader DaemonSets.
pub const MODULE_LOADER_ROLE: &str = "module-loader";
/// Role label value of device-plugin DaemonSets.
pub const DEVICE_PLUGIN_ROLE: &str = "device-plugin";

/// Container name in module-loader pods.
pub const MODULE_LOADER_CONTAINER_NAME: &str = "module-loader";
/// Container name in device-plugin pods.
pub const DEVICE_PLUGIN_CONTAINER_NAME: &str = "device-plugin";

/// Priority class of every generated pod.
pub const PRIORITY_CLASS_NAME: &str = "system-node-critical";

pub(crate) const KUBELET_DEVICE_PLUGINS_VOLUME_NAME: &str = "kubelet-device-plugins";
pub(crate) const KUBELET_DEVICE_PLUGINS_PATH: &str = "/var/lib/kubelet/device-plugins";
pub(crate) const NODE_LIB_MODULES_PATH: &str = "/lib/modules";
pub(crate) const NODE_LIB_MODULES_VOLUME_NAME: &str = "node-lib-modules";
pub(crate) const NODE_USR_LIB_MODULES_PATH: &str = "/usr/lib/modules";
pub(crate) const NODE_USR_LIB_MODULES_VOLUME_NAME: &str = "node-usr-lib-modules";
pub(crate) const NODE_VAR_LIB_FIRMWARE_PATH: &str = "/var/lib/firmware";
pub(crate) const NODE_VAR_LIB_FIRMWARE_VOLUME_NAME: &str = "node-var-lib-firmware";

/// Kernel label value of the device-plugin DaemonSet and its pods.
pub(crate) const DEVICE_PLUGIN_KERNEL_VERSION: &str = "";

pub(crate) const HOST_PATH_DIRECTORY: &str = "Directory";
pub(crate) const HOST_PATH_DIRECTORY_OR_CREATE: &str = "DirectoryOrCreate";

//! Module CRD
//!
//! Declares a kernel module: how to load it on matching nodes and an optional
//! device plugin that runs once the module is loaded.

use k8s_openapi::api::core::v1::{
    EnvVar, LocalObjectReference, ResourceRequirements, Volume, VolumeMount,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of a kernel module on the cluster
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "kmm.sigs.x-k8s.io",
    version = "v1beta1",
    kind = "Module",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    /// Module loader configuration
    pub module_loader: ModuleLoaderSpec,

    /// Device plugin deployed on nodes where the module is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_plugin: Option<DevicePluginSpec>,

    /// Secret used to pull the module loader and device plugin images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_repo_secret: Option<LocalObjectReference>,

    /// Node labels the module is scheduled on
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
}

/// Module loader DaemonSets, one per kernel version
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLoaderSpec {
    /// Module loader container
    pub container: ModuleLoaderContainerSpec,

    /// Service account the module loader pods run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// Module loader container settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLoaderContainerSpec {
    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// How the kernel module is loaded and unloaded
    pub modprobe: ModprobeSpec,
}

/// modprobe invocation for loading and unloading the kernel module.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModprobeSpec {
    /// Name of the kernel module to load
    pub module_name: String,

    /// Root directory for modules (`modprobe -d`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_name: Option<String>,

    /// Directory in the image holding firmware files, staged into
    /// `/var/lib/firmware/<module>` before the module is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_path: Option<String>,

    /// Parameters passed to the module on load
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,

    /// Replacement for the default modprobe flags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<ModprobeArgs>,

    /// Complete modprobe arguments; all other fields are ignored for a
    /// direction that has raw args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_args: Option<ModprobeArgs>,
}

/// modprobe arguments per direction
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModprobeArgs {
    /// Arguments used when loading the module
    #[serde(default)]
    pub load: Vec<String>,

    /// Arguments used when unloading the module
    #[serde(default)]
    pub unload: Vec<String>,
}

/// Device plugin DaemonSet, scheduled on nodes where the module is ready
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DevicePluginSpec {
    /// Device plugin container
    pub container: DevicePluginContainerSpec,

    /// Service account the device plugin pods run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,

    /// Extra volumes made available to the device plugin pod
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// Device plugin container settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DevicePluginContainerSpec {
    /// Device plugin image
    pub image: String,

    /// Image pull policy (Always, IfNotPresent, Never)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Entrypoint override
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Arguments to the entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// Compute resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Mounts of the pod volumes declared in [`DevicePluginSpec::volumes`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

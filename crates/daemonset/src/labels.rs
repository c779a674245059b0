//! Label, selector and pull-secret helpers.

use crate::constants::{DEVICE_PLUGIN_KERNEL_VERSION, NODE_LABEL_PREFIX};
use k8s_openapi::api::core::v1::LocalObjectReference;
use std::collections::BTreeMap;

/// Returns `labels` with every key of `overrides` set to its override value.
///
/// Neither input is modified; callers reusing a base label map across several
/// DaemonSets never observe each other's changes.
pub fn override_labels(
    labels: Option<&BTreeMap<String, String>>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = labels.cloned().unwrap_or_default();
    merged.extend(
        overrides
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    merged
}

/// Deep copy of a label map.
pub fn copy_labels(labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    labels.clone()
}

/// Projects the Module's optional image repo secret into a pod's pull secrets.
pub fn pod_pull_secrets(secret: Option<&LocalObjectReference>) -> Vec<LocalObjectReference> {
    secret.cloned().into_iter().collect()
}

/// Node label set once the module is loaded on a node.
pub fn driver_container_node_label(module_name: &str) -> String {
    format!("{NODE_LABEL_PREFIX}/{module_name}.ready")
}

/// Node label set once the module's device plugin runs on a node.
pub fn device_plugin_node_label(module_name: &str) -> String {
    format!("{NODE_LABEL_PREFIX}/{module_name}.device-plugin-ready")
}

/// Whether a raw kernel label value denotes the device-plugin DaemonSet.
pub fn is_device_plugin_kernel_version(kernel_version: &str) -> bool {
    kernel_version == DEVICE_PLUGIN_KERNEL_VERSION
}

/// Kernel label value carried by the device-plugin DaemonSet.
pub fn device_plugin_kernel_version() -> &'static str {
    DEVICE_PLUGIN_KERNEL_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_override_labels_merges() {
        let existing = labels(&[("app", "custom"), ("role", "old")]);
        let overrides = labels(&[("role", "module-loader"), ("module", "kmm-ci")]);

        let merged = override_labels(Some(&existing), &overrides);

        assert_eq!(
            merged,
            labels(&[("app", "custom"), ("role", "module-loader"), ("module", "kmm-ci")])
        );
        // Inputs untouched
        assert_eq!(existing.get("role").map(String::as_str), Some("old"));
        assert_eq!(overrides.len(), 2);
    }

    #[test]
    fn test_override_labels_without_existing() {
        let overrides = labels(&[("a", "1")]);
        assert_eq!(override_labels(None, &overrides), overrides);
    }

    #[test]
    fn test_copy_labels_is_independent() {
        let original = labels(&[("a", "1")]);
        let mut copy = copy_labels(&original);
        copy.insert("b".to_string(), "2".to_string());

        assert_eq!(original.len(), 1);
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn test_pod_pull_secrets() {
        assert!(pod_pull_secrets(None).is_empty());

        let secret: LocalObjectReference =
            serde_json::from_value(serde_json::json!({ "name": "pull-secret" })).unwrap();
        assert_eq!(pod_pull_secrets(Some(&secret)), vec![secret]);
    }

    #[test]
    fn test_node_labels() {
        assert_eq!(
            driver_container_node_label("kmm-ci"),
            "kmm.node.kubernetes.io/kmm-ci.ready"
        );
        assert_eq!(
            device_plugin_node_label("kmm-ci"),
            "kmm.node.kubernetes.io/kmm-ci.device-plugin-ready"
        );
        assert_ne!(driver_container_node_label("a"), driver_container_node_label("b"));
    }

    #[test]
    fn test_device_plugin_kernel_version() {
        assert!(is_device_plugin_kernel_version(device_plugin_kernel_version()));
        assert!(!is_device_plugin_kernel_version("5.14.0-70.el9.x86_64"));
    }
}

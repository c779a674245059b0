//! DaemonSet object store abstraction.
//!
//! Lookup and garbage collection are the only operations that reach the
//! cluster. They go through [`DaemonSetStore`] so that the Kubernetes-backed
//! implementation can be swapped for the in-memory mock in unit tests.

use k8s_openapi::api::apps::v1::DaemonSet;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned by a [`DaemonSetStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object cannot be written as given
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// Store could not be reached or rejected the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for DaemonSet read/write operations.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait DaemonSetStore: Send + Sync {
    /// Lists DaemonSets in `namespace` carrying every label in `match_labels`.
    async fn list(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<DaemonSet>, StoreError>;

    /// Gets a DaemonSet by name, `None` if it does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<DaemonSet>, StoreError>;

    /// Creates or replaces the DaemonSet with the given desired state.
    async fn apply(&self, namespace: &str, ds: &DaemonSet) -> Result<DaemonSet, StoreError>;

    /// Deletes a DaemonSet by name.
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}

/// Formats `match_labels` as an equality-based label selector string.
pub fn label_selector(match_labels: &BTreeMap<String, String>) -> String {
    match_labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `labels` carries every key/value pair of `match_labels`.
pub fn matches_labels(
    labels: Option<&BTreeMap<String, String>>,
    match_labels: &BTreeMap<String, String>,
) -> bool {
    match_labels
        .iter()
        .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
}

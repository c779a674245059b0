//! In-memory [`DaemonSetStore`] for unit testing.
//!
//! Stores DaemonSets keyed by namespace/name and can be told to fail `list`
//! or `delete` calls so error paths can be exercised without a cluster.

use crate::store::{matches_labels, DaemonSetStore, StoreError};
use k8s_openapi::api::apps::v1::DaemonSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

/// Mock DaemonSet store.
#[derive(Debug, Clone, Default)]
pub struct MockDaemonSetStore {
    daemonsets: Arc<Mutex<BTreeMap<Key, DaemonSet>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    failing_deletes: Arc<Mutex<BTreeSet<String>>>,
    fail_list: Arc<Mutex<Option<String>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key_of(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

impl MockDaemonSetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a DaemonSet to the mock store (for test setup).
    ///
    /// The namespace is taken from the object's metadata. An object without
    /// one is stored, and later listed, in `default`, as the API server would.
    pub fn add(&self, mut ds: DaemonSet) {
        let namespace = ds
            .metadata
            .namespace
            .get_or_insert_with(|| "default".to_string())
            .clone();
        let name = ds.metadata.name.clone().unwrap_or_default();
        lock(&self.daemonsets).insert((namespace, name), ds);
    }

    /// Makes every `delete` of `name` fail.
    pub fn fail_delete_of(&self, name: impl Into<String>) {
        lock(&self.failing_deletes).insert(name.into());
    }

    /// Makes every `list` fail with `message`.
    pub fn fail_list(&self, message: impl Into<String>) {
        *lock(&self.fail_list) = Some(message.into());
    }

    /// Names of successfully deleted DaemonSets, in call order.
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    /// Names of the DaemonSets currently stored in `namespace`.
    pub fn names(&self, namespace: &str) -> Vec<String> {
        lock(&self.daemonsets)
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DaemonSetStore for MockDaemonSetStore {
    async fn list(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<DaemonSet>, StoreError> {
        if let Some(message) = lock(&self.fail_list).clone() {
            return Err(StoreError::Unavailable(message));
        }

        Ok(lock(&self.daemonsets)
            .iter()
            .filter(|((ns, _), ds)| {
                ns == namespace && matches_labels(ds.metadata.labels.as_ref(), match_labels)
            })
            .map(|(_, ds)| ds.clone())
            .collect())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<DaemonSet>, StoreError> {
        Ok(lock(&self.daemonsets).get(&key_of(namespace, name)).cloned())
    }

    async fn apply(&self, namespace: &str, ds: &DaemonSet) -> Result<DaemonSet, StoreError> {
        let name = ds
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::InvalidObject("DaemonSet has no name".to_string()))?;

        let mut stored = ds.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        lock(&self.daemonsets).insert((namespace.to_string(), name), stored.clone());
        Ok(stored)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        if lock(&self.failing_deletes).contains(name) {
            return Err(StoreError::Unavailable(format!("injected delete failure for {name}")));
        }

        lock(&self.daemonsets)
            .remove(&key_of(namespace, name))
            .ok_or_else(|| StoreError::NotFound(format!("DaemonSet {namespace}/{name}")))?;
        lock(&self.deleted).push(name.to_string());
        Ok(())
    }
}

//! Kubernetes-backed [`DaemonSetStore`].

use crate::store::{label_selector, DaemonSetStore, StoreError};
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Field manager used for server-side apply of generated DaemonSets.
pub const FIELD_MANAGER: &str = "kmm-daemonset";

/// [`DaemonSetStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeDaemonSetStore {
    client: Client,
}

impl std::fmt::Debug for KubeDaemonSetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeDaemonSetStore").finish_non_exhaustive()
    }
}

impl KubeDaemonSetStore {
    /// Creates a store using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from the in-cluster or kubeconfig defaults.
    pub async fn try_default() -> Result<Self, StoreError> {
        Ok(Self::new(Client::try_default().await?))
    }

    fn api(&self, namespace: &str) -> Api<DaemonSet> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Desired state of `ds` as sent in a server-side apply patch.
///
/// The API server rejects apply patches that carry `managedFields`, and
/// `status` is not owned by this field manager.
pub fn apply_body(ds: &DaemonSet) -> DaemonSet {
    let mut body = ds.clone();
    body.metadata.managed_fields = None;
    body.status = None;
    body
}

#[async_trait::async_trait]
impl DaemonSetStore for KubeDaemonSetStore {
    async fn list(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<DaemonSet>, StoreError> {
        let selector = label_selector(match_labels);
        debug!("Listing DaemonSets in {} with selector {}", namespace, selector);

        let list = self
            .api(namespace)
            .list(&ListParams::default().labels(&selector))
            .await?;
        Ok(list.items)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<Option<DaemonSet>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn apply(&self, namespace: &str, ds: &DaemonSet) -> Result<DaemonSet, StoreError> {
        let name = ds
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| StoreError::InvalidObject("DaemonSet has no name".to_string()))?;

        let pp = PatchParams::apply(FIELD_MANAGER).force();
        let body = apply_body(ds);
        Ok(self.api(namespace).patch(name, &pp, &Patch::Apply(&body)).await?)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

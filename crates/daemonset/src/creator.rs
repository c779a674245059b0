//! Lookup, desired-state and garbage collection of a Module's DaemonSets.
//!
//! [`DaemonSetCreator`] ties the pure generators to a [`DaemonSetStore`]. The
//! only calls that reach the store are the list in
//! [`DaemonSetCreator::module_daemonsets_by_kernel_version`] and the deletes
//! in [`DaemonSetCreator::garbage_collect`]; errors from either are returned
//! as-is and never retried here.

use crate::config::DaemonSetConfig;
use crate::constants::MODULE_NAME_LABEL;
use crate::error::DaemonSetError;
use crate::generator::DaemonSetGenerator;
use crate::index::ModuleDaemonSets;
use crate::role::readiness_label_for;
use crate::store::DaemonSetStore;
use crds::Module;
use k8s_openapi::api::apps::v1::DaemonSet;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info};

/// Manages the DaemonSets of Modules through a [`DaemonSetStore`].
#[derive(Debug)]
pub struct DaemonSetCreator<S> {
    store: S,
    generator: DaemonSetGenerator,
}

impl<S: DaemonSetStore> DaemonSetCreator<S> {
    /// Creates a creator over `store`, generating with `config`.
    pub fn new(store: S, config: DaemonSetConfig) -> Self {
        Self {
            store,
            generator: DaemonSetGenerator::new(config),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The generator used by the `set_*_as_desired` methods.
    pub fn generator(&self) -> &DaemonSetGenerator {
        &self.generator
    }

    /// Active configuration.
    pub fn config(&self) -> &DaemonSetConfig {
        self.generator.config()
    }

    /// Lists the DaemonSets of Module `namespace/name` and indexes them by
    /// kernel version.
    pub async fn module_daemonsets_by_kernel_version(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ModuleDaemonSets, DaemonSetError> {
        let selector = BTreeMap::from([(MODULE_NAME_LABEL.to_string(), name.to_string())]);

        let daemonsets = self
            .store
            .list(namespace, &selector)
            .await
            .map_err(|e| {
                error!("Failed to list DaemonSets for module {}/{}: {}", namespace, name, e);
                DaemonSetError::List {
                    namespace: namespace.to_string(),
                    module: name.to_string(),
                    source: e,
                }
            })?;

        debug!(
            "Found {} DaemonSets for module {}/{}",
            daemonsets.len(),
            namespace,
            name
        );
        ModuleDaemonSets::index(daemonsets, &self.config().kernel_label)
    }

    /// Deletes every module-loader DaemonSet whose kernel version is not in
    /// `valid_kernels` and returns the names of the deleted DaemonSets.
    ///
    /// The device-plugin DaemonSet is never deleted. Deletion stops at the
    /// first failure, including a DaemonSet without a namespace; DaemonSets
    /// deleted before it stay deleted.
    pub async fn garbage_collect(
        &self,
        existing: &ModuleDaemonSets,
        valid_kernels: &BTreeSet<String>,
    ) -> Result<Vec<String>, DaemonSetError> {
        let mut deleted = Vec::new();

        for (kernel_version, ds) in &existing.module_loaders {
            if valid_kernels.contains(kernel_version) {
                continue;
            }

            let name = ds.name_any();
            let namespace = ds.namespace().ok_or_else(|| {
                DaemonSetError::InvalidInput(format!("DaemonSet {name} has no namespace"))
            })?;

            self.store.delete(&namespace, &name).await.map_err(|e| {
                error!("Failed to delete DaemonSet {}/{}: {}", namespace, name, e);
                DaemonSetError::Delete {
                    namespace: namespace.clone(),
                    name: name.clone(),
                    source: e,
                }
            })?;

            info!(
                "Deleted DaemonSet {}/{} for stale kernel {}",
                namespace, name, kernel_version
            );
            deleted.push(name);
        }

        Ok(deleted)
    }

    /// Replaces `ds` with the desired module-loader DaemonSet.
    ///
    /// On error `ds` is left unchanged.
    pub fn set_driver_container_as_desired(
        &self,
        ds: &mut DaemonSet,
        image: &str,
        module: &Module,
        kernel_version: &str,
    ) -> Result<(), DaemonSetError> {
        *ds = self.generator.module_loader(ds, image, module, kernel_version)?;
        Ok(())
    }

    /// Replaces `ds` with the desired device-plugin DaemonSet.
    ///
    /// On error `ds` is left unchanged.
    pub fn set_device_plugin_as_desired(
        &self,
        ds: &mut DaemonSet,
        module: &Module,
    ) -> Result<(), DaemonSetError> {
        *ds = self.generator.device_plugin(ds, module)?;
        Ok(())
    }

    /// Node readiness label that `pod` signals for `module_name`.
    pub fn node_label_from_pod(&self, pod: &Pod, module_name: &str) -> String {
        readiness_label_for(
            pod.metadata.labels.as_ref(),
            &self.config().kernel_label,
            module_name,
        )
    }
}

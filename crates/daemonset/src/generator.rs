//! Desired-state generation of module-loader and device-plugin DaemonSets.
//!
//! Generators are pure: they take the current DaemonSet (or an empty one for a
//! new object) and return the desired DaemonSet. The caller applies it. On
//! error nothing is returned, so a half-built object can never be applied.

use crate::command::{firmware_path, make_load_command, make_unload_command, module_firmware_dir};
use crate::config::DaemonSetConfig;
use crate::constants::*;
use crate::error::DaemonSetError;
use crate::labels::{copy_labels, driver_container_node_label, override_labels, pod_pull_secrets};
use crate::ownership::set_controller_reference;
use crate::role::WorkloadRole;
use crds::Module;
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, ExecAction, HostPathVolumeSource, Lifecycle, LifecycleHandler,
    PodSpec, PodTemplateSpec, SELinuxOptions, SecurityContext, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;
use tracing::debug;

/// Builds desired DaemonSets for Modules.
#[derive(Debug, Clone, Default)]
pub struct DaemonSetGenerator {
    config: DaemonSetConfig,
}

impl DaemonSetGenerator {
    /// Creates a generator using `config`.
    pub fn new(config: DaemonSetConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub fn config(&self) -> &DaemonSetConfig {
        &self.config
    }

    /// Desired module-loader DaemonSet for `module` on nodes running
    /// `kernel_version`, pulling the module from `image`.
    pub fn module_loader(
        &self,
        existing: &DaemonSet,
        image: &str,
        module: &Module,
        kernel_version: &str,
    ) -> Result<DaemonSet, DaemonSetError> {
        if image.is_empty() {
            return Err(DaemonSetError::InvalidInput("image cannot be empty".to_string()));
        }
        if kernel_version.is_empty() {
            return Err(DaemonSetError::InvalidInput(
                "kernelVersion cannot be empty".to_string(),
            ));
        }
        let module_name = module_name(module)?;

        let role = WorkloadRole::ModuleLoader {
            kernel_version: kernel_version.to_string(),
        };
        let standard_labels = self.standard_labels(module_name, &role);

        let mut node_selector = copy_labels(&module.spec.selector);
        node_selector.insert(self.config.kernel_label.clone(), kernel_version.to_string());

        let loader = &module.spec.module_loader;
        let modprobe = &loader.container.modprobe;

        let mut volume_mounts = vec![
            read_only_mount(NODE_LIB_MODULES_VOLUME_NAME, NODE_LIB_MODULES_PATH),
            read_only_mount(NODE_USR_LIB_MODULES_VOLUME_NAME, NODE_USR_LIB_MODULES_PATH),
        ];
        let mut volumes = vec![
            host_path_volume(NODE_LIB_MODULES_VOLUME_NAME, NODE_LIB_MODULES_PATH, HOST_PATH_DIRECTORY),
            host_path_volume(
                NODE_USR_LIB_MODULES_VOLUME_NAME,
                NODE_USR_LIB_MODULES_PATH,
                HOST_PATH_DIRECTORY,
            ),
        ];

        if firmware_path(modprobe).is_some() {
            let firmware_dir = module_firmware_dir(module_name);
            volumes.push(host_path_volume(
                NODE_VAR_LIB_FIRMWARE_VOLUME_NAME,
                &firmware_dir,
                HOST_PATH_DIRECTORY_OR_CREATE,
            ));
            volume_mounts.push(VolumeMount {
                name: NODE_VAR_LIB_FIRMWARE_VOLUME_NAME.to_string(),
                mount_path: firmware_dir,
                ..Default::default()
            });
        }

        let container = Container {
            name: MODULE_LOADER_CONTAINER_NAME.to_string(),
            image: Some(image.to_string()),
            image_pull_policy: loader.container.image_pull_policy.clone(),
            command: Some(vec!["sleep".to_string(), "infinity".to_string()]),
            lifecycle: Some(Lifecycle {
                post_start: Some(exec_handler(make_load_command(modprobe, module_name))),
                pre_stop: Some(exec_handler(make_unload_command(modprobe, module_name))),
                ..Default::default()
            }),
            security_context: Some(SecurityContext {
                allow_privilege_escalation: Some(false),
                capabilities: Some(Capabilities {
                    add: Some(vec!["SYS_MODULE".to_string()]),
                    ..Default::default()
                }),
                run_as_user: Some(0),
                se_linux_options: Some(SELinuxOptions {
                    type_: Some("spc_t".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        };

        let pod_spec = PodSpec {
            containers: vec![container],
            image_pull_secrets: Some(pod_pull_secrets(module.spec.image_repo_secret.as_ref())),
            node_selector: Some(node_selector),
            priority_class_name: Some(PRIORITY_CLASS_NAME.to_string()),
            service_account_name: loader.service_account_name.clone(),
            volumes: Some(volumes),
            ..Default::default()
        };

        debug!(
            "Generated module-loader DaemonSet for {} on kernel {}",
            module_name, kernel_version
        );
        self.finish(existing, module, standard_labels, pod_spec)
    }

    /// Desired device-plugin DaemonSet for `module`.
    ///
    /// The Module must declare a device plugin; callers decide up front
    /// whether to generate one.
    pub fn device_plugin(
        &self,
        existing: &DaemonSet,
        module: &Module,
    ) -> Result<DaemonSet, DaemonSetError> {
        let device_plugin = module.spec.device_plugin.as_ref().ok_or_else(|| {
            DaemonSetError::InvalidInput("device plugin in module should not be nil".to_string())
        })?;
        let module_name = module_name(module)?;

        let standard_labels = self.standard_labels(module_name, &WorkloadRole::DevicePlugin);
        let dp = &device_plugin.container;

        let mut volume_mounts = dp.volume_mounts.clone();
        volume_mounts.push(VolumeMount {
            name: KUBELET_DEVICE_PLUGINS_VOLUME_NAME.to_string(),
            mount_path: KUBELET_DEVICE_PLUGINS_PATH.to_string(),
            ..Default::default()
        });

        let mut volumes = vec![host_path_volume(
            KUBELET_DEVICE_PLUGINS_VOLUME_NAME,
            KUBELET_DEVICE_PLUGINS_PATH,
            HOST_PATH_DIRECTORY,
        )];
        volumes.extend(device_plugin.volumes.iter().cloned());

        let container = Container {
            name: DEVICE_PLUGIN_CONTAINER_NAME.to_string(),
            image: Some(dp.image.clone()),
            image_pull_policy: dp.image_pull_policy.clone(),
            command: non_empty(&dp.command),
            args: non_empty(&dp.args),
            env: non_empty(&dp.env),
            resources: dp.resources.clone(),
            security_context: Some(SecurityContext {
                privileged: Some(true),
                ..Default::default()
            }),
            volume_mounts: Some(volume_mounts),
            ..Default::default()
        };

        let pod_spec = PodSpec {
            containers: vec![container],
            image_pull_secrets: Some(pod_pull_secrets(module.spec.image_repo_secret.as_ref())),
            node_selector: Some(BTreeMap::from([(
                driver_container_node_label(module_name),
                String::new(),
            )])),
            priority_class_name: Some(PRIORITY_CLASS_NAME.to_string()),
            service_account_name: device_plugin.service_account_name.clone(),
            volumes: Some(volumes),
            ..Default::default()
        };

        debug!("Generated device-plugin DaemonSet for {}", module_name);
        self.finish(existing, module, standard_labels, pod_spec)
    }

    fn standard_labels(&self, module_name: &str, role: &WorkloadRole) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::from([
            (MODULE_NAME_LABEL.to_string(), module_name.to_string()),
            (DAEMONSET_ROLE_LABEL.to_string(), role.as_str().to_string()),
        ]);
        if let Some(kernel_version) = role.kernel_version() {
            labels.insert(self.config.kernel_label.clone(), kernel_version.to_string());
        }
        labels
    }

    /// Assembles the DaemonSet around `pod_spec` and sets its owner.
    fn finish(
        &self,
        existing: &DaemonSet,
        module: &Module,
        standard_labels: BTreeMap<String, String>,
        pod_spec: PodSpec,
    ) -> Result<DaemonSet, DaemonSetError> {
        let mut metadata = existing.metadata.clone();
        metadata.labels = Some(override_labels(existing.metadata.labels.as_ref(), &standard_labels));
        set_controller_reference(module, &mut metadata)?;

        Ok(DaemonSet {
            metadata,
            spec: Some(DaemonSetSpec {
                selector: LabelSelector {
                    match_labels: Some(standard_labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(standard_labels),
                        finalizers: Some(vec![NODE_LABELER_FINALIZER.to_string()]),
                        ..Default::default()
                    }),
                    spec: Some(pod_spec),
                },
                ..Default::default()
            }),
            status: existing.status.clone(),
        })
    }
}

fn module_name(module: &Module) -> Result<&str, DaemonSetError> {
    module
        .metadata
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DaemonSetError::InvalidInput("module name cannot be empty".to_string()))
}

fn non_empty<T: Clone>(items: &[T]) -> Option<Vec<T>> {
    (!items.is_empty()).then(|| items.to_vec())
}

fn exec_handler(command: Vec<String>) -> LifecycleHandler {
    LifecycleHandler {
        exec: Some(ExecAction {
            command: Some(command),
        }),
        ..Default::default()
    }
}

fn read_only_mount(name: &str, path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        read_only: Some(true),
        ..Default::default()
    }
}

fn host_path_volume(name: &str, path: &str, type_: &str) -> Volume {
    Volume {
        name: name.to_string(),
        host_path: Some(HostPathVolumeSource {
            path: path.to_string(),
            type_: Some(type_.to_string()),
        }),
        ..Default::default()
    }
}

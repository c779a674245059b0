//! Controller owner references from a Module to its DaemonSets.
//!
//! Deleting a Module cascades to every DaemonSet generated for it through the
//! controller owner reference set here.

use crate::error::DaemonSetError;
use crds::Module;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;

/// Sets `module` as the controller owner of the object described by `meta`.
///
/// An existing reference to the same Module is replaced. Fails if a different
/// object already holds the controller reference, or if the object lives in
/// another namespace than the Module.
pub fn set_controller_reference(
    module: &Module,
    meta: &mut ObjectMeta,
) -> Result<(), DaemonSetError> {
    let owner = module.controller_owner_ref(&()).ok_or_else(|| {
        DaemonSetError::InvalidInput("module must have a name and a uid".to_string())
    })?;

    // Owner references cannot cross namespaces
    let module_namespace = module.metadata.namespace.as_deref();
    if let Some(namespace) = meta
        .namespace
        .as_deref()
        .filter(|ns| module_namespace != Some(*ns))
    {
        return Err(DaemonSetError::InvalidInput(format!(
            "cross-namespace owner references are disallowed: module {} is in namespace {:?}, DaemonSet {} is in namespace {:?}",
            owner.name,
            module_namespace.unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default(),
            namespace,
        )));
    }

    let mut refs = meta.owner_references.take().unwrap_or_default();

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && !same_object(r, &owner))
    {
        let err = DaemonSetError::AlreadyOwned {
            daemonset: meta.name.clone().unwrap_or_default(),
            owner_kind: other.kind.clone(),
            owner_name: other.name.clone(),
        };
        meta.owner_references = Some(refs);
        return Err(err);
    }

    refs.retain(|r| !same_object(r, &owner));
    refs.push(owner);
    meta.owner_references = Some(refs);
    Ok(())
}

fn api_group(api_version: &str) -> &str {
    api_version.rsplit_once('/').map_or("", |(group, _)| group)
}

fn same_object(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

//! Controller references between objects.
use crate::{object::Object, scheme::Scheme, Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

/// The owner reference of the object's controller, if any
pub fn controller_of(obj: &dyn Object) -> Option<&OwnerReference> {
    obj.object_meta()
        .owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|owner| owner.controller == Some(true))
}

fn refers_to(reference: &OwnerReference, scheme: &Scheme, owner: &dyn Object) -> Result<bool> {
    let gvk = scheme.gvk_for_object(owner)?;
    let meta = owner.object_meta();
    Ok(reference.api_version == gvk.api_version()
        && reference.kind == gvk.kind
        && Some(&reference.name) == meta.name.as_ref()
        && Some(&reference.uid) == meta.uid.as_ref())
}

/// Returns true if `obj` is controlled by `owner`
///
/// An object without a controller reference is not controlled by anything. Otherwise the
/// owner's kind is looked up in the scheme, and apiVersion, kind, name and uid must all match.
pub fn is_controlled_by(scheme: &Scheme, owner: &dyn Object, obj: &dyn Object) -> Result<bool> {
    match controller_of(obj) {
        Some(controller) => refers_to(controller, scheme, owner),
        None => Ok(false),
    }
}

/// Keeps the objects controlled by `owner`, in order
pub fn filter_controlled_by<'a, I>(
    scheme: &Scheme,
    owner: &dyn Object,
    objs: I,
) -> Result<Vec<&'a dyn Object>>
where
    I: IntoIterator<Item = &'a dyn Object>,
{
    let mut controlled = vec![];
    for obj in objs {
        if is_controlled_by(scheme, owner, obj)? {
            controlled.push(obj);
        }
    }
    Ok(controlled)
}

/// Makes `owner` the controller of `obj`
///
/// Adds a controller [`OwnerReference`] with `blockOwnerDeletion` set, or updates the existing
/// reference to the same owner. Fails if the owner has no name or uid, if a namespaced owner
/// lives in another namespace than the object, or if the object already has another controller.
pub fn set_controller_reference(scheme: &Scheme, owner: &dyn Object, obj: &mut dyn Object) -> Result<()> {
    let gvk = scheme.gvk_for_object(owner)?;
    let owner_meta = owner.object_meta();
    let (Some(name), Some(uid)) = (owner_meta.name.clone(), owner_meta.uid.clone()) else {
        return Err(Error::MissingOwnerIdentity(owner.name_any()));
    };
    if let Some(owner_ns) = owner_meta.namespace.as_deref().filter(|ns| !ns.is_empty()) {
        let obj_ns = obj.object_meta().namespace.as_deref();
        if obj_ns != Some(owner_ns) {
            return Err(Error::CrossNamespaceOwner {
                owner: owner_ns.to_string(),
                object: obj_ns.map(String::from),
            });
        }
    }
    if let Some(existing) = controller_of(obj) {
        if !refers_to(existing, scheme, owner)? {
            return Err(Error::AlreadyOwned {
                kind: existing.kind.clone(),
                name: existing.name.clone(),
            });
        }
    }

    let reference = OwnerReference {
        api_version: gvk.api_version(),
        kind: gvk.kind,
        name,
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    };
    tracing::trace!(owner = %reference.name, object = %obj.name_any(), "setting controller reference");
    let refs = obj.object_meta_mut().owner_references.get_or_insert_with(Vec::new);
    match refs.iter_mut().find(|r| r.uid == reference.uid) {
        Some(existing) => *existing = reference,
        None => refs.push(reference),
    }
    Ok(())
}

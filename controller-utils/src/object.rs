//! Type-erased handles to Kubernetes objects.
use kube_core::{
    metadata::{ObjectMeta, TypeMeta},
    DynamicObject, GroupVersionKind, Resource,
};
use serde::Serialize;
use std::{any::Any, fmt::Debug};

/// A handle to a single Kubernetes object whose concrete type is erased
///
/// This is what lists and slices are converted to and from. A handle exposes the identity
/// metadata and the static type information of the object, and can be downcast back
/// to the concrete type.
///
/// `Object` is implemented for every [`Resource`] that knows its type information at
/// compile time, i.e. all `k8s_openapi` types and all types generated by `#[derive(CustomResource)]`.
/// [`DynamicObject`] is deliberately not an `Object`; use a [`Scheme`](crate::Scheme) to convert it.
pub trait Object: Any + Debug + Send + Sync + 'static {
    /// Metadata of the object
    fn object_meta(&self) -> &ObjectMeta;

    /// Mutable metadata of the object
    fn object_meta_mut(&mut self) -> &mut ObjectMeta;

    /// The group version kind of the concrete type
    fn object_gvk(&self) -> GroupVersionKind;

    /// The group version kind of `Self`, without an instance
    fn type_gvk() -> GroupVersionKind
    where
        Self: Sized;

    /// The name of the concrete type, for diagnostics
    fn object_type_name(&self) -> &'static str;

    /// Serializes the object into a [`DynamicObject`] with its type fields filled in
    fn to_dynamic(&self) -> Result<DynamicObject, serde_json::Error>;

    /// Clones the object behind a new box
    fn boxed_clone(&self) -> Box<dyn Object>;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<K> Object for K
where
    K: Resource<DynamicType = ()> + Clone + Debug + Serialize + Send + Sync + 'static,
{
    fn object_meta(&self) -> &ObjectMeta {
        self.meta()
    }

    fn object_meta_mut(&mut self) -> &mut ObjectMeta {
        self.meta_mut()
    }

    fn object_gvk(&self) -> GroupVersionKind {
        K::type_gvk()
    }

    fn type_gvk() -> GroupVersionKind {
        GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()))
    }

    fn object_type_name(&self) -> &'static str {
        std::any::type_name::<K>()
    }

    fn to_dynamic(&self) -> Result<DynamicObject, serde_json::Error> {
        let mut obj: DynamicObject = serde_json::from_value(serde_json::to_value(self)?)?;
        obj.types = Some(TypeMeta {
            api_version: K::api_version(&()).into_owned(),
            kind: K::kind(&()).into_owned(),
        });
        Ok(obj)
    }

    fn boxed_clone(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Object {
    /// Returns true if the handle refers to a `K`
    pub fn is<K: Object>(&self) -> bool {
        self.as_any().is::<K>()
    }

    /// Returns the concrete object if it is a `K`
    pub fn downcast_ref<K: Object>(&self) -> Option<&K> {
        self.as_any().downcast_ref()
    }

    /// Returns the concrete object mutably if it is a `K`
    pub fn downcast_mut<K: Object>(&mut self) -> Option<&mut K> {
        self.as_any_mut().downcast_mut()
    }

    /// The name of the object, falling back on `generateName` and then an empty string
    pub fn name_any(&self) -> String {
        let meta = self.object_meta();
        meta.name
            .clone()
            .or_else(|| meta.generate_name.clone())
            .unwrap_or_default()
    }
}

impl Clone for Box<dyn Object> {
    fn clone(&self) -> Self {
        (**self).boxed_clone()
    }
}

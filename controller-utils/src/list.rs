//! Typed lists and their conversion to and from uniform object handles.
use crate::{object::Object, Error, Result};
use kube_core::{
    metadata::{ListMeta, TypeMeta},
    object::ObjectList,
    GroupVersionKind, Resource,
};
use serde::{Deserialize, Serialize};
use std::{
    any::{type_name, Any, TypeId},
    fmt,
};

/// Typed access to the items of a Kubernetes list
///
/// This is the capability every list container exposes: an ordered `items` sequence of one
/// concrete element type, plus the list-level [`ListMeta`] (continue token, resource version).
///
/// Implemented for [`TypedList`], [`k8s_openapi::List`] and [`kube_core::object::ObjectList`].
/// Implement it for your own list structs to make them usable with [`AnyList`].
pub trait ListLike {
    /// The element type of the list
    type Item: Object + Clone;

    /// The items of the list
    fn items(&self) -> &[Self::Item];

    /// Mutable access to the items of the list
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;

    /// List metadata
    fn list_meta(&self) -> &ListMeta;

    /// Mutable list metadata
    fn list_meta_mut(&mut self) -> &mut ListMeta;
}

/// An object-safe view of a [`ListLike`]
///
/// This is what a [`Scheme`](crate::Scheme) hands out when allocating a list for a
/// [`GroupVersionKind`] only known at runtime. It is implemented for every `ListLike`.
pub trait AnyList: Any + Send + Sync + 'static {
    /// The [`TypeId`] of the element type
    fn item_type_id(&self) -> TypeId;

    /// The name of the element type, for diagnostics
    fn item_type_name(&self) -> &'static str;

    /// The group version kind of the element type
    fn item_gvk(&self) -> GroupVersionKind;

    /// Number of items in the list
    fn len(&self) -> usize;

    /// Returns true if the list has no items
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List metadata
    fn meta(&self) -> &ListMeta;

    /// Mutable list metadata
    fn meta_mut(&mut self) -> &mut ListMeta;

    /// Handles to the items, in order
    fn objects(&self) -> Vec<&dyn Object>;

    /// Mutable handles to the items, in order
    fn objects_mut(&mut self) -> Vec<&mut dyn Object>;

    /// Replaces the items with clones of `objs`
    ///
    /// Every handle is checked against the element type before the list is modified,
    /// so on error the list is left untouched.
    fn set_objects(&mut self, objs: &[&dyn Object]) -> Result<()>;

    /// Upcast for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<L> AnyList for L
where
    L: ListLike + Send + Sync + 'static,
{
    fn item_type_id(&self) -> TypeId {
        TypeId::of::<L::Item>()
    }

    fn item_type_name(&self) -> &'static str {
        type_name::<L::Item>()
    }

    fn item_gvk(&self) -> GroupVersionKind {
        <L::Item as Object>::type_gvk()
    }

    fn len(&self) -> usize {
        self.items().len()
    }

    fn meta(&self) -> &ListMeta {
        self.list_meta()
    }

    fn meta_mut(&mut self) -> &mut ListMeta {
        self.list_meta_mut()
    }

    fn objects(&self) -> Vec<&dyn Object> {
        extract_object_slice(self.items())
    }

    fn objects_mut(&mut self) -> Vec<&mut dyn Object> {
        extract_object_slice_mut(self.items_mut())
    }

    fn set_objects(&mut self, objs: &[&dyn Object]) -> Result<()> {
        set_object_slice(self.items_mut(), objs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn AnyList {
    /// Returns the concrete list if it is an `L`
    pub fn downcast_ref<L: AnyList>(&self) -> Option<&L> {
        self.as_any().downcast_ref()
    }

    /// Returns the concrete list mutably if it is an `L`
    pub fn downcast_mut<L: AnyList>(&mut self) -> Option<&mut L> {
        self.as_any_mut().downcast_mut()
    }
}

impl fmt::Debug for dyn AnyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyList")
            .field("item_type", &self.item_type_name())
            .field("len", &self.len())
            .finish()
    }
}

/// Returns handles to the items of a list, in order
///
/// The handles borrow the list's own storage.
pub fn extract_list(list: &dyn AnyList) -> Vec<&dyn Object> {
    list.objects()
}

/// Returns mutable handles to the items of a list, in order
///
/// Mutating a handle mutates the item in the list.
pub fn extract_list_mut(list: &mut dyn AnyList) -> Vec<&mut dyn Object> {
    list.objects_mut()
}

/// Replaces the items of a list with clones of the given objects, preserving order
///
/// Fails with [`Error::TypeMismatch`] if any object is not of the list's element type.
/// The list is unchanged in that case.
pub fn set_list(list: &mut dyn AnyList, objs: &[&dyn Object]) -> Result<()> {
    list.set_objects(objs)
}

/// Calls `f` with every item of the list, in order
///
/// Stops at and returns the first error returned by `f`; later items are not visited.
pub fn each_list_item<E>(
    list: &mut dyn AnyList,
    mut f: impl FnMut(&mut dyn Object) -> Result<(), E>,
) -> Result<(), E> {
    for obj in list.objects_mut() {
        f(obj)?;
    }
    Ok(())
}

/// Returns handles to the elements of a slice, in order
pub fn extract_object_slice<K: Object>(slice: &[K]) -> Vec<&dyn Object> {
    slice.iter().map(|obj| obj as &dyn Object).collect()
}

/// Returns mutable handles to the elements of a slice, in order
pub fn extract_object_slice_mut<K: Object>(slice: &mut [K]) -> Vec<&mut dyn Object> {
    slice.iter_mut().map(|obj| obj as &mut dyn Object).collect()
}

/// Replaces the contents of `dst` with clones of the given objects, preserving order
///
/// Fails with [`Error::TypeMismatch`] if any object is not a `K`; `dst` is unchanged in that case.
pub fn set_object_slice<K: Object + Clone>(dst: &mut Vec<K>, objs: &[&dyn Object]) -> Result<()> {
    let items = objs
        .iter()
        .map(|obj| {
            obj.downcast_ref::<K>()
                .cloned()
                .ok_or_else(|| Error::type_mismatch(type_name::<K>(), obj.object_type_name()))
        })
        .collect::<Result<Vec<_>>>()?;
    *dst = items;
    Ok(())
}

/// A generic Kubernetes object list
///
/// The list type a [`Scheme`](crate::Scheme) allocates by default. It serializes like
/// any `FooList` returned from the apiserver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TypedList<K> {
    /// The type fields, not always present
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeMeta>,

    /// ListMeta - `resourceVersion` and `continue` token
    #[serde(default)]
    pub metadata: ListMeta,

    /// The items of the list
    #[serde(default, bound(deserialize = "Vec<K>: Deserialize<'de>"))]
    pub items: Vec<K>,
}

impl<K> Default for TypedList<K> {
    fn default() -> Self {
        Self {
            types: None,
            metadata: ListMeta::default(),
            items: Vec::new(),
        }
    }
}

impl<K> TypedList<K> {
    /// An empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// A list holding `items`
    pub fn from_items(items: Vec<K>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Returns an iterator over the items
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.items.iter()
    }

    /// Returns an iterator of mutable references to the items
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut K> {
        self.items.iter_mut()
    }
}

impl<K: Resource<DynamicType = ()>> TypedList<K> {
    /// Fill in `apiVersion` and `kind` (`FooList`) from the element type
    #[must_use]
    pub fn with_types(mut self) -> Self {
        self.types = Some(TypeMeta {
            api_version: K::api_version(&()).into_owned(),
            kind: format!("{}List", K::kind(&())),
        });
        self
    }
}

impl<K> IntoIterator for TypedList<K> {
    type IntoIter = ::std::vec::IntoIter<Self::Item>;
    type Item = K;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, K> IntoIterator for &'a TypedList<K> {
    type IntoIter = ::std::slice::Iter<'a, K>;
    type Item = &'a K;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, K> IntoIterator for &'a mut TypedList<K> {
    type IntoIter = ::std::slice::IterMut<'a, K>;
    type Item = &'a mut K;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl<K> FromIterator<K> for TypedList<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl<K: Object + Clone> ListLike for TypedList<K> {
    type Item = K;

    fn items(&self) -> &[K] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<K> {
        &mut self.items
    }

    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn list_meta_mut(&mut self) -> &mut ListMeta {
        &mut self.metadata
    }
}

impl<K> ListLike for k8s_openapi::List<K>
where
    K: k8s_openapi::ListableResource + Object + Clone,
{
    type Item = K;

    fn items(&self) -> &[K] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<K> {
        &mut self.items
    }

    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn list_meta_mut(&mut self) -> &mut ListMeta {
        &mut self.metadata
    }
}

impl<K: Object + Clone> ListLike for ObjectList<K> {
    type Item = K;

    fn items(&self) -> &[K] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<K> {
        &mut self.items
    }

    fn list_meta(&self) -> &ListMeta {
        &self.metadata
    }

    fn list_meta_mut(&mut self) -> &mut ListMeta {
        &mut self.metadata
    }
}

//! A registry mapping group version kinds to concrete object and list types.
use crate::{
    list::{AnyList, ListLike, TypedList},
    object::Object,
    unstructured::parse_group_version,
    Error, Result,
};
use ahash::AHashMap;
use kube_core::{DynamicObject, GroupVersionKind};
use serde::de::DeserializeOwned;
use std::{
    any::{type_name, TypeId},
    fmt,
};

struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    list_type_name: &'static str,
    new_list: fn() -> Box<dyn AnyList>,
    decode: fn(serde_json::Value) -> Result<Box<dyn Object>, serde_json::Error>,
}

fn new_list<L>() -> Box<dyn AnyList>
where
    L: ListLike + Default + Send + Sync + 'static,
{
    Box::new(L::default())
}

fn decode<K>(value: serde_json::Value) -> Result<Box<dyn Object>, serde_json::Error>
where
    K: Object + DeserializeOwned,
{
    Ok(Box::new(serde_json::from_value::<K>(value)?))
}

/// A type registry for Kubernetes objects
///
/// A `Scheme` knows, for every registered [`GroupVersionKind`], the concrete object type,
/// the list type to allocate for it and how to decode an untyped object into it.
/// It is the piece that lets callers go from a type descriptor only known at runtime back
/// to statically typed values.
///
/// Build it once and share it; it is immutable after construction.
///
/// ```
/// use controller_utils::{Scheme, TypedList};
/// use k8s_openapi::api::core::v1::{ConfigMap, Secret};
/// use kube_core::GroupVersionKind;
///
/// let scheme = Scheme::new().with::<ConfigMap>().with::<Secret>();
/// let list = scheme
///     .new_list_for_gvk(&GroupVersionKind::gvk("", "v1", "Secret"))
///     .unwrap();
/// assert!(list.downcast_ref::<TypedList<Secret>>().is_some());
/// ```
#[derive(Default)]
pub struct Scheme {
    by_gvk: AHashMap<GroupVersionKind, Registration>,
    by_type: AHashMap<TypeId, GroupVersionKind>,
}

impl fmt::Debug for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self
            .by_gvk
            .iter()
            .map(|(gvk, reg)| (format!("{}/{}", gvk.api_version(), gvk.kind), reg.list_type_name))
            .collect();
        kinds.sort();
        f.debug_struct("Scheme").field("kinds", &kinds).finish()
    }
}

impl Scheme {
    /// An empty scheme
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `K`, with [`TypedList<K>`] as its list type
    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Object + Clone + DeserializeOwned,
    {
        self.register_list::<TypedList<K>>()
    }

    /// Register the element type of `L`, with `L` as its list type
    ///
    /// Registering the same kind again replaces the previous registration, and the
    /// displaced type is no longer recognized.
    pub fn register_list<L>(&mut self) -> &mut Self
    where
        L: ListLike + Default + Send + Sync + 'static,
        L::Item: DeserializeOwned,
    {
        let gvk = <L::Item as Object>::type_gvk();
        tracing::debug!(
            api_version = %gvk.api_version(),
            kind = %gvk.kind,
            list = type_name::<L>(),
            "registering kind"
        );
        let type_id = TypeId::of::<L::Item>();
        let displaced = self.by_gvk.insert(gvk.clone(), Registration {
            type_id,
            type_name: type_name::<L::Item>(),
            list_type_name: type_name::<L>(),
            new_list: new_list::<L>,
            decode: decode::<L::Item>,
        });
        if let Some(old) = displaced.filter(|old| old.type_id != type_id) {
            tracing::debug!(kind = %gvk.kind, replaced = old.type_name, "kind registered to a new type");
            self.by_type.remove(&old.type_id);
        }
        self.by_type.insert(type_id, gvk);
        self
    }

    /// Builder variant of [`Scheme::register`]
    #[must_use]
    pub fn with<K>(mut self) -> Self
    where
        K: Object + Clone + DeserializeOwned,
    {
        self.register::<K>();
        self
    }

    /// Builder variant of [`Scheme::register_list`]
    #[must_use]
    pub fn with_list<L>(mut self) -> Self
    where
        L: ListLike + Default + Send + Sync + 'static,
        L::Item: DeserializeOwned,
    {
        self.register_list::<L>();
        self
    }

    /// Returns true if a type is registered for `gvk`
    pub fn recognizes(&self, gvk: &GroupVersionKind) -> bool {
        self.by_gvk.contains_key(gvk)
    }

    /// All registered kinds, in no particular order
    pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.by_gvk.keys()
    }

    /// The name of the concrete type registered for `gvk`
    pub fn type_name_for_gvk(&self, gvk: &GroupVersionKind) -> Result<&'static str> {
        self.registration(gvk).map(|reg| reg.type_name)
    }

    fn registration(&self, gvk: &GroupVersionKind) -> Result<&Registration> {
        self.by_gvk
            .get(gvk)
            .ok_or_else(|| Error::NotRegistered(gvk.clone()))
    }

    fn gvk_for_type_id(&self, id: TypeId, name: &'static str) -> Result<GroupVersionKind> {
        self.by_type
            .get(&id)
            .cloned()
            .ok_or(Error::UnregisteredType(name))
    }

    /// The group version kind `K` is registered under
    pub fn gvk_for_type<K: Object>(&self) -> Result<GroupVersionKind> {
        self.gvk_for_type_id(TypeId::of::<K>(), type_name::<K>())
    }

    /// The group version kind the object's concrete type is registered under
    ///
    /// Fails with [`Error::UnregisteredType`] if the type was never registered.
    pub fn gvk_for_object(&self, obj: &dyn Object) -> Result<GroupVersionKind> {
        self.gvk_for_type_id(obj.as_any().type_id(), obj.object_type_name())
    }

    /// The group version kind of the elements of a list
    pub fn gvk_for_list(&self, list: &dyn AnyList) -> Result<GroupVersionKind> {
        self.gvk_for_type_id(list.item_type_id(), list.item_type_name())
    }

    /// Allocates an empty list of the list type registered for `gvk`
    ///
    /// Fails with [`Error::NotRegistered`] for an unknown kind.
    pub fn new_list_for_gvk(&self, gvk: &GroupVersionKind) -> Result<Box<dyn AnyList>> {
        Ok((self.registration(gvk)?.new_list)())
    }

    /// Allocates an empty list for the object's registered kind
    pub fn new_list_for_object(&self, obj: &dyn Object) -> Result<Box<dyn AnyList>> {
        self.new_list_for_gvk(&self.gvk_for_object(obj)?)
    }

    /// Decodes an untyped object into the concrete type registered for its kind
    pub fn convert(&self, obj: DynamicObject) -> Result<Box<dyn Object>> {
        let gvk = dynamic_gvk(&obj)?;
        let reg = self.registration(&gvk)?;
        tracing::trace!(kind = %gvk.kind, target = reg.type_name, "converting dynamic object");
        let value = serde_json::to_value(obj).map_err(Error::SerdeError)?;
        (reg.decode)(value).map_err(Error::SerdeError)
    }

    /// Converts every object to the list's element type and sets them as the list's items
    ///
    /// Objects of another kind fail with [`Error::TypeMismatch`]. Every object is converted
    /// before the list is touched, so on error the list is unchanged.
    pub fn convert_and_set_list<I>(&self, list: &mut dyn AnyList, objs: I) -> Result<()>
    where
        I: IntoIterator<Item = DynamicObject>,
    {
        let expected = self.gvk_for_list(list)?;
        let converted = objs
            .into_iter()
            .map(|obj| {
                let gvk = dynamic_gvk(&obj)?;
                if gvk != expected {
                    return Err(Error::type_mismatch(
                        format!("{}/{}", expected.api_version(), expected.kind),
                        format!("{}/{}", gvk.api_version(), gvk.kind),
                    ));
                }
                self.convert(obj)
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(kind = %expected.kind, count = converted.len(), "setting converted list");
        let handles: Vec<&dyn Object> = converted.iter().map(|obj| &**obj).collect();
        list.set_objects(&handles)
    }
}

/// The group version kind declared by an untyped object
fn dynamic_gvk(obj: &DynamicObject) -> Result<GroupVersionKind> {
    let types = obj.types.as_ref().ok_or(Error::MissingTypeMeta)?;
    if types.kind.is_empty() || types.api_version.is_empty() {
        return Err(Error::MissingTypeMeta);
    }
    let gv = parse_group_version(&types.api_version)?;
    Ok(GroupVersionKind::gvk(&gv.group, &gv.version, &types.kind))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::list::{extract_list, set_list};
    use k8s_openapi::api::{
        apps::v1::Deployment,
        core::v1::{ConfigMap, Secret},
    };
    use kube_core::{
        metadata::{ListMeta, ObjectMeta},
        object::ObjectList,
        Resource,
    };
    use serde::{Deserialize, Serialize};
    use std::borrow::Cow;

    fn scheme() -> Scheme {
        Scheme::new()
            .with::<ConfigMap>()
            .with::<Secret>()
            .with::<Deployment>()
    }

    fn configmap(name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                namespace: Some("foo".into()),
                name: Some(name.into()),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    /// A resource with static type information that is never registered
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct Unregistered {
        metadata: ObjectMeta,
    }

    impl Resource for Unregistered {
        type DynamicType = ();
        type Scope = k8s_openapi::NamespaceResourceScope;

        fn kind(_: &()) -> Cow<'_, str> {
            "Unregistered".into()
        }

        fn group(_: &()) -> Cow<'_, str> {
            "example.com".into()
        }

        fn version(_: &()) -> Cow<'_, str> {
            "v1".into()
        }

        fn plural(_: &()) -> Cow<'_, str> {
            "unregistereds".into()
        }

        fn meta(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }
    }

    /// A local stand-in registered under the core ConfigMap kind
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct LocalConfigMap {
        metadata: ObjectMeta,
    }

    impl Resource for LocalConfigMap {
        type DynamicType = ();
        type Scope = k8s_openapi::NamespaceResourceScope;

        fn kind(_: &()) -> Cow<'_, str> {
            "ConfigMap".into()
        }

        fn group(_: &()) -> Cow<'_, str> {
            "".into()
        }

        fn version(_: &()) -> Cow<'_, str> {
            "v1".into()
        }

        fn plural(_: &()) -> Cow<'_, str> {
            "configmaps".into()
        }

        fn meta(&self) -> &ObjectMeta {
            &self.metadata
        }

        fn meta_mut(&mut self) -> &mut ObjectMeta {
            &mut self.metadata
        }
    }

    #[test]
    fn gvk_for_registered_objects() {
        let scheme = scheme();
        let deploy = Deployment::default();
        assert_eq!(
            scheme.gvk_for_object(&deploy).unwrap(),
            GroupVersionKind::gvk("apps", "v1", "Deployment")
        );
        assert_eq!(
            scheme.gvk_for_type::<ConfigMap>().unwrap(),
            GroupVersionKind::gvk("", "v1", "ConfigMap")
        );
        assert!(scheme.recognizes(&GroupVersionKind::gvk("", "v1", "Secret")));
        assert_eq!(scheme.kinds().count(), 3);
    }

    #[test]
    fn gvk_for_unregistered_object_fails() {
        let err = scheme().gvk_for_object(&Unregistered::default()).unwrap_err();
        assert!(matches!(err, Error::UnregisteredType(_)), "{err}");
    }

    #[test]
    fn gvk_for_list_returns_element_kind() {
        let scheme = scheme();
        let list = TypedList::<Deployment>::new();
        assert_eq!(
            scheme.gvk_for_list(&list).unwrap(),
            GroupVersionKind::gvk("apps", "v1", "Deployment")
        );
        let list = TypedList::<Unregistered>::new();
        assert!(scheme.gvk_for_list(&list).is_err());
    }

    #[test]
    fn new_list_for_gvk_allocates_registered_list_type() {
        let list = scheme()
            .new_list_for_gvk(&GroupVersionKind::gvk("", "v1", "Secret"))
            .unwrap();
        assert!(list.is_empty());
        assert!(list.downcast_ref::<TypedList<Secret>>().is_some());
    }

    #[test]
    fn new_list_for_unknown_gvk_is_not_found() {
        let err = scheme()
            .new_list_for_gvk(&GroupVersionKind::gvk("", "", ""))
            .unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)), "{err}");
    }

    #[test]
    fn new_list_for_object() {
        let scheme = scheme();
        let list = scheme.new_list_for_object(&Secret::default()).unwrap();
        assert!(list.downcast_ref::<TypedList<Secret>>().is_some());
        assert!(scheme.new_list_for_object(&Unregistered::default()).is_err());
    }

    #[test]
    fn custom_list_types_can_be_registered() {
        #[derive(Default)]
        struct ConfigMaps {
            metadata: ListMeta,
            items: Vec<ConfigMap>,
        }

        impl ListLike for ConfigMaps {
            type Item = ConfigMap;

            fn items(&self) -> &[ConfigMap] {
                &self.items
            }

            fn items_mut(&mut self) -> &mut Vec<ConfigMap> {
                &mut self.items
            }

            fn list_meta(&self) -> &ListMeta {
                &self.metadata
            }

            fn list_meta_mut(&mut self) -> &mut ListMeta {
                &mut self.metadata
            }
        }

        let scheme = Scheme::new().with_list::<ConfigMaps>();
        let mut list = scheme
            .new_list_for_gvk(&GroupVersionKind::gvk("", "v1", "ConfigMap"))
            .unwrap();
        set_list(list.as_mut(), &[&configmap("n1")]).unwrap();
        let list = list.downcast_ref::<ConfigMaps>().unwrap();
        assert_eq!(list.items, vec![configmap("n1")]);
    }

    #[test]
    fn reregistering_a_kind_forgets_the_displaced_type() {
        let scheme = Scheme::new().with::<ConfigMap>().with::<LocalConfigMap>();
        let gvk = GroupVersionKind::gvk("", "v1", "ConfigMap");

        let stale = TypedList::from_items(vec![configmap("n1")]);
        let err = scheme.gvk_for_list(&stale).unwrap_err();
        assert!(matches!(err, Error::UnregisteredType(_)), "{err}");
        assert!(scheme.gvk_for_object(&configmap("n1")).is_err());

        let local = LocalConfigMap {
            metadata: configmap("n1").metadata,
        };
        let src = TypedList::from_items(vec![local.clone()]);
        assert_eq!(scheme.gvk_for_list(&src).unwrap(), gvk);
        let mut dst = scheme.new_list_for_gvk(&gvk).unwrap();
        set_list(dst.as_mut(), &extract_list(&src)).unwrap();
        assert_eq!(
            dst.downcast_ref::<TypedList<LocalConfigMap>>().unwrap().items,
            vec![local]
        );
    }

    #[test]
    fn reregistering_the_same_type_keeps_it() {
        let mut scheme = Scheme::new();
        scheme.register::<ConfigMap>();
        scheme.register::<ConfigMap>();
        assert_eq!(
            scheme.gvk_for_type::<ConfigMap>().unwrap(),
            GroupVersionKind::gvk("", "v1", "ConfigMap")
        );
        assert_eq!(scheme.kinds().count(), 1);
    }

    #[test]
    fn round_trip_through_fresh_list() {
        let scheme = scheme();
        let src = TypedList::from_items(vec![configmap("n1"), configmap("n2")]);

        let mut dst = scheme.new_list_for_gvk(&scheme.gvk_for_list(&src).unwrap()).unwrap();
        set_list(dst.as_mut(), &extract_list(&src)).unwrap();

        assert_eq!(dst.downcast_ref::<TypedList<ConfigMap>>(), Some(&src));
    }

    #[test]
    fn convert_and_set_list_converts_typed_and_dynamic_objects() {
        let scheme = scheme();
        let mut list = TypedList::<ConfigMap>::new();
        let dynamic: DynamicObject = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
        }))
        .unwrap();

        scheme
            .convert_and_set_list(&mut list, vec![ConfigMap::default().to_dynamic().unwrap(), dynamic])
            .unwrap();
        assert_eq!(list.items, vec![ConfigMap::default(), ConfigMap::default()]);
    }

    #[test]
    fn convert_and_set_list_rejects_other_kinds() {
        let scheme = scheme();
        let mut list = TypedList::from_items(vec![configmap("keep")]);
        let secret = Secret::default().to_dynamic().unwrap();

        let err = scheme.convert_and_set_list(&mut list, vec![secret]).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }), "{err}");
        assert_eq!(list.items, vec![configmap("keep")]);
    }

    #[test]
    fn convert_requires_type_meta() {
        let obj: DynamicObject = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "untyped" }
        }))
        .unwrap();
        assert!(matches!(scheme().convert(obj), Err(Error::MissingTypeMeta)));
    }

    #[test]
    fn convert_into_registered_type() {
        let obj: DynamicObject = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "n1", "namespace": "foo" },
            "data": { "key": "value" }
        }))
        .unwrap();
        let converted = scheme().convert(obj).unwrap();
        let cm = converted.downcast_ref::<ConfigMap>().unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("n1"));
        assert_eq!(cm.data.as_ref().unwrap()["key"], "value");
    }

    #[test]
    fn object_lists_from_kube_are_list_like() {
        let scheme = scheme();
        let mut list: ObjectList<ConfigMap> = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "ConfigMapList",
            "metadata": {},
            "items": []
        }))
        .unwrap();
        scheme
            .convert_and_set_list(&mut list, vec![configmap("n1").to_dynamic().unwrap()])
            .unwrap();
        assert_eq!(list.items, vec![configmap("n1")]);
    }
}

//! Helpers for building Kubernetes controllers on top of [`kube_core`] and `k8s_openapi`
//!
//! The central piece is the list converter: typed lists are exposed through the [`ListLike`]
//! capability and its object-safe view [`AnyList`], so lists and slices of concrete resources
//! can be read and written through uniform [`Object`] handles without knowing the element type
//! at compile time. A [`Scheme`] maps [`GroupVersionKind`]s back to concrete types for allocating
//! new lists and converting untyped [`DynamicObject`](kube_core::DynamicObject)s.
//!
//! ```
//! use controller_utils::{extract_list, set_list, Object, Scheme};
//! use k8s_openapi::api::core::v1::ConfigMap;
//! use kube_core::{metadata::ObjectMeta, GroupVersionKind};
//!
//! let scheme = Scheme::new().with::<ConfigMap>();
//! let cm = ConfigMap {
//!     metadata: ObjectMeta {
//!         name: Some("n1".into()),
//!         ..ObjectMeta::default()
//!     },
//!     ..ConfigMap::default()
//! };
//!
//! let mut list = scheme.new_list_for_gvk(&GroupVersionKind::gvk("", "v1", "ConfigMap")).unwrap();
//! set_list(list.as_mut(), &[&cm]).unwrap();
//! assert_eq!(extract_list(list.as_ref())[0].object_meta().name.as_deref(), Some("n1"));
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod error;
pub use error::Error;

pub mod object;
pub use object::Object;

pub mod list;
pub use list::{
    each_list_item, extract_list, extract_list_mut, extract_object_slice, extract_object_slice_mut,
    set_list, set_object_slice, AnyList, ListLike, TypedList,
};

pub mod unstructured;

pub mod scheme;
pub use scheme::Scheme;

pub mod owner;

#[cfg_attr(docsrs, doc(cfg(feature = "manifest")))]
#[cfg(feature = "manifest")]
pub mod manifest;

pub mod must;

pub use kube_core::GroupVersionKind;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

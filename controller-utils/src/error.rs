//! Error handling in [`controller_utils`][crate]
use kube_core::{gvk::ParseGroupVersionError, GroupVersionKind};
use thiserror::Error;

/// Possible errors when converting, registering or decoding objects
#[derive(Error, Debug)]
pub enum Error {
    /// The value is not list-shaped
    ///
    /// Returned when an untyped value has no `items` array.
    #[error("ShapeError: {0}")]
    Shape(String),

    /// An element cannot be assigned to the destination's element type
    #[error("TypeError: cannot use {found} as {expected}")]
    TypeMismatch {
        /// The element type of the destination
        expected: String,
        /// The type that was offered
        found: String,
    },

    /// No type is registered for the group version kind
    #[error("NotFoundError: no type registered for {}/{}", .0.api_version(), .0.kind)]
    NotRegistered(GroupVersionKind),

    /// The concrete type was never registered in the scheme
    #[error("no kind is registered for the type {0}")]
    UnregisteredType(&'static str),

    /// An untyped object lacks `apiVersion` or `kind`
    #[error("object has no apiVersion or kind")]
    MissingTypeMeta,

    /// An `apiVersion` could not be parsed
    #[error("InvalidGroupVersion: {0}")]
    InvalidGroupVersion(#[source] ParseGroupVersionError),

    /// Common error case when converting between typed and untyped objects
    #[error("Error deserializing object: {0}")]
    SerdeError(#[source] serde_json::Error),

    /// A manifest document could not be parsed
    #[cfg(feature = "manifest")]
    #[cfg_attr(docsrs, doc(cfg(feature = "manifest")))]
    #[error("Error parsing manifest: {0}")]
    YamlError(#[source] serde_yaml::Error),

    /// The owner lacks the name or uid needed for an owner reference
    #[error("owner {0} has no name or uid")]
    MissingOwnerIdentity(String),

    /// A namespaced owner cannot control an object in another namespace
    #[error("owner namespace {owner:?} does not match object namespace {object:?}")]
    CrossNamespaceOwner {
        /// Namespace of the owner
        owner: String,
        /// Namespace of the object, if any
        object: Option<String>,
    },

    /// The object already has a different controller
    #[error("object is already controlled by {kind} {name}")]
    AlreadyOwned {
        /// Kind of the existing controller
        kind: String,
        /// Name of the existing controller
        name: String,
    },
}

impl Error {
    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

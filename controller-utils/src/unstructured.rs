//! List operations on untyped json values.
//!
//! Here the shape of a list is only known at runtime: a value is list-shaped if it is an
//! object with an `items` array. Anything else is rejected with [`Error::Shape`].
use crate::{Error, Result};
use kube_core::{
    gvk::{GroupVersion, ParseGroupVersionError},
    GroupVersionKind,
};
use serde_json::Value;

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Returns the items of an untyped list
///
/// `items: null` is read as an empty list.
pub fn items(list: &Value) -> Result<&[Value]> {
    let obj = list
        .as_object()
        .ok_or_else(|| Error::Shape(format!("expected a list object, got {}", describe(list))))?;
    match obj.get("items") {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) => Ok(&[]),
        Some(other) => Err(Error::Shape(format!(
            "items must be an array, got {}",
            describe(other)
        ))),
        None => Err(Error::Shape("value has no items field".into())),
    }
}

/// Returns mutable references to the items of an untyped list, in order
pub fn extract_items(list: &mut Value) -> Result<Vec<&mut Value>> {
    let kind = describe(list);
    let obj = list
        .as_object_mut()
        .ok_or_else(|| Error::Shape(format!("expected a list object, got {kind}")))?;
    match obj.get_mut("items") {
        Some(Value::Array(items)) => Ok(items.iter_mut().collect()),
        Some(Value::Null) => Ok(vec![]),
        Some(other) => Err(Error::Shape(format!(
            "items must be an array, got {}",
            describe(other)
        ))),
        None => Err(Error::Shape("value has no items field".into())),
    }
}

/// Parses an `apiVersion`, rejecting an empty version and more than one `/`
pub(crate) fn parse_group_version(api_version: &str) -> Result<GroupVersion> {
    let gv: GroupVersion = api_version.parse().map_err(Error::InvalidGroupVersion)?;
    if gv.version.is_empty() || gv.version.contains('/') {
        return Err(Error::InvalidGroupVersion(ParseGroupVersionError(
            api_version.into(),
        )));
    }
    Ok(gv)
}

/// The group version kind of the elements of an untyped list
///
/// Derived from the list's own `apiVersion` and `kind` by stripping the `List` suffix.
/// Returns `None` if the list does not declare its type, and fails with
/// [`Error::InvalidGroupVersion`] if its `apiVersion` is malformed.
pub fn item_gvk(list: &Value) -> Result<Option<GroupVersionKind>> {
    let api_version = list.get("apiVersion").and_then(Value::as_str);
    let kind = list.get("kind").and_then(Value::as_str);
    let (Some(api_version), Some(kind)) = (api_version, kind) else {
        return Ok(None);
    };
    let Some(item_kind) = kind.strip_suffix("List").filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let gv = parse_group_version(api_version)?;
    Ok(Some(GroupVersionKind::gvk(&gv.group, &gv.version, item_kind)))
}

fn check_item(expected: Option<&GroupVersionKind>, item: &Value) -> Result<()> {
    if !item.is_object() {
        return Err(Error::type_mismatch("an object", describe(item)));
    }
    let Some(gvk) = expected else {
        return Ok(());
    };
    let api_version = item.get("apiVersion").and_then(Value::as_str);
    let kind = item.get("kind").and_then(Value::as_str);
    let expected_api_version = gvk.api_version();
    if api_version.is_some_and(|av| av != expected_api_version) || kind.is_some_and(|k| k != gvk.kind) {
        return Err(Error::type_mismatch(
            format!("{expected_api_version}/{}", gvk.kind),
            format!("{}/{}", api_version.unwrap_or_default(), kind.unwrap_or_default()),
        ));
    }
    Ok(())
}

/// Replaces the items of an untyped list, preserving order
///
/// Fails with [`Error::Shape`] if `list` is not list-shaped, and with [`Error::TypeMismatch`]
/// if an item is not an object or declares a type other than the list's element type.
/// Items without `apiVersion`/`kind` are accepted as is. A typed list with a malformed
/// `apiVersion` fails with [`Error::InvalidGroupVersion`] before any item is checked.
/// Nothing is written on error.
pub fn set_items(list: &mut Value, new_items: Vec<Value>) -> Result<()> {
    items(list)?;
    let expected = item_gvk(list)?;
    for item in &new_items {
        check_item(expected.as_ref(), item)?;
    }
    tracing::trace!(count = new_items.len(), "setting untyped list items");
    if let Some(obj) = list.as_object_mut() {
        obj.insert("items".into(), Value::Array(new_items));
    }
    Ok(())
}

/// Calls `f` with every item of an untyped list, in order
///
/// Stops at and returns the first error returned by `f`.
pub fn each_item<E: From<Error>>(
    list: &mut Value,
    mut f: impl FnMut(&mut Value) -> Result<(), E>,
) -> Result<(), E> {
    for item in extract_items(list)? {
        f(item)?;
    }
    Ok(())
}

//! Decoding manifests into objects and lists.
//!
//! A manifest is a stream of YAML (or JSON) documents separated by `---`, such as the
//! output of `kustomize build` or `helm template`. Empty documents are skipped and a
//! `v1/List` document is expanded into its items.
use crate::{list::AnyList, object::Object, scheme::Scheme, Error, Result};
use kube_core::DynamicObject;
use serde::Deserialize;
use serde_yaml::Value;

fn is_core_list(doc: &Value) -> bool {
    doc.get("apiVersion").and_then(Value::as_str) == Some("v1")
        && doc.get("kind").and_then(Value::as_str) == Some("List")
}

/// Decodes every document of a manifest into a [`DynamicObject`], in order
pub fn decode_dynamic_objects(manifest: &str) -> Result<Vec<DynamicObject>> {
    let mut objs = vec![];
    for document in serde_yaml::Deserializer::from_str(manifest) {
        let doc = Value::deserialize(document).map_err(Error::YamlError)?;
        if doc.is_null() {
            continue;
        }
        if is_core_list(&doc) {
            let items = match doc.get("items") {
                Some(Value::Sequence(items)) => items.clone(),
                Some(Value::Null) | None => vec![],
                Some(_) => return Err(Error::Shape("List document items must be a sequence".into())),
            };
            for item in items {
                objs.push(serde_yaml::from_value(item).map_err(Error::YamlError)?);
            }
            continue;
        }
        objs.push(serde_yaml::from_value(doc).map_err(Error::YamlError)?);
    }
    tracing::debug!(count = objs.len(), "decoded manifest");
    Ok(objs)
}

/// Decodes every document of a manifest into its registered concrete type, in order
///
/// Every document must declare an `apiVersion` and `kind` registered in the scheme.
pub fn decode_objects(scheme: &Scheme, manifest: &str) -> Result<Vec<Box<dyn Object>>> {
    decode_dynamic_objects(manifest)?
        .into_iter()
        .map(|obj| scheme.convert(obj))
        .collect()
}

/// Decodes a manifest and sets its objects as the items of `list`
///
/// Every document must be of the list's element kind. The list is unchanged on error.
pub fn decode_into_list(scheme: &Scheme, manifest: &str, list: &mut dyn AnyList) -> Result<()> {
    let objs = decode_dynamic_objects(manifest)?;
    scheme.convert_and_set_list(list, objs)
}

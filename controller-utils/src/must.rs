//! Fail-fast variants of the fallible conversions
//!
//! For call sites where a conversion failure is a programming error rather than a recoverable
//! condition, e.g. a list type that was just allocated from the same scheme.
//! Every function here panics with the underlying [`Error`](crate::Error) instead of returning it.
use crate::{list, object::Object, scheme::Scheme, unstructured, AnyList, GroupVersionKind};
use serde_json::Value;
use std::fmt::Display;

#[track_caller]
fn assert_ok<T, E: Display>(res: Result<T, E>, what: &str) -> T {
    match res {
        Ok(value) => value,
        Err(err) => panic!("{what}: {err}"),
    }
}

/// Like [`set_list`](crate::set_list), panicking on error
#[track_caller]
pub fn set_list(list: &mut dyn AnyList, objs: &[&dyn Object]) {
    assert_ok(list::set_list(list, objs), "failed to set list items");
}

/// Like [`set_object_slice`](crate::set_object_slice), panicking on error
#[track_caller]
pub fn set_object_slice<K: Object + Clone>(dst: &mut Vec<K>, objs: &[&dyn Object]) {
    assert_ok(list::set_object_slice(dst, objs), "failed to set object slice");
}

/// Like [`unstructured::extract_items`], panicking on error
#[track_caller]
pub fn extract_items(list: &mut Value) -> Vec<&mut Value> {
    assert_ok(unstructured::extract_items(list), "failed to extract list items")
}

/// Like [`unstructured::set_items`], panicking on error
#[track_caller]
pub fn set_items(list: &mut Value, items: Vec<Value>) {
    assert_ok(unstructured::set_items(list, items), "failed to set list items");
}

/// Like [`Scheme::new_list_for_gvk`], panicking on error
#[track_caller]
pub fn new_list_for_gvk(scheme: &Scheme, gvk: &GroupVersionKind) -> Box<dyn AnyList> {
    assert_ok(scheme.new_list_for_gvk(gvk), "failed to create list")
}

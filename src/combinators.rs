use std::collections::BTreeMap;

use crate::{constant, derive::Derivation, Accessor, AccessorState, Causes, Error, Value};


/// Returns `true` if `value` is an accessor.
pub fn is_accessor(value: &Value) -> bool {
    matches!(value, Value::Accessor(_))
}

/// Returns `value` itself if it is an accessor, otherwise a constant accessor holding it.
pub fn cast(value: impl Into<Value>) -> Accessor {
    match value.into() {
        Value::Accessor(accessor) => accessor,
        value => constant(value),
    }
}

/// Applies `f` to the resolved values of `args`, in order.
///
/// Arguments that are not accessors are treated as constants.
/// The result is errored with the causes of every errored argument if any is errored,
/// unresolved if any argument is unresolved, and otherwise resolved to the value returned by `f`.
/// If `f` returns an accessor, the join mirrors it until one of `args` transitions again,
/// at which point `f` is evaluated afresh.
pub fn join<R: Into<Value>>(
    args: impl IntoIterator<Item = impl Into<Value>>,
    f: impl Fn(&[Value]) -> R + 'static,
) -> Accessor {
    Derivation::map(args.into_iter().map(cast), move |values| {
        AccessorState::Resolved(f(&values).into())
    })
}

/// Same as [`join`], with the handler first.
pub fn future<R: Into<Value>>(
    f: impl Fn(&[Value]) -> R + 'static,
    args: impl IntoIterator<Item = impl Into<Value>>,
) -> Accessor {
    join(args, f)
}

/// Resolves to the values of every element of a sequence once all of them are resolved.
///
/// `items` is an array of accessors or plain values, or an accessor resolving to such an array.
/// An empty array (or [`Value::Undefined`]) resolves immediately to an empty array.
pub fn all(items: impl Into<Value>) -> Accessor {
    match items.into() {
        Value::Accessor(source) => Derivation::map([source], |mut values| {
            AccessorState::Resolved(Value::Accessor(all_of(values.swap_remove(0))))
        }),
        items => all_of(items),
    }
}

fn all_of(items: Value) -> Accessor {
    let items = match items {
        Value::Array(items) => items,
        Value::Undefined => Vec::new(),
        value => return not_a_collection("array", &value),
    };
    Derivation::map(items.into_iter().map(cast), |values| {
        AccessorState::Resolved(Value::Array(values))
    })
}

/// Resolves to an object with the values of every entry of `items` once all of them are resolved.
///
/// `items` is an object whose values are accessors or plain values, or an accessor resolving to such an object.
/// An empty object (or [`Value::Undefined`]) resolves immediately to an empty object.
pub fn props(items: impl Into<Value>) -> Accessor {
    match items.into() {
        Value::Accessor(source) => Derivation::map([source], |mut values| {
            AccessorState::Resolved(Value::Accessor(props_of(values.swap_remove(0))))
        }),
        items => props_of(items),
    }
}

fn props_of(items: Value) -> Accessor {
    let items = match items {
        Value::Object(items) => items,
        Value::Undefined => BTreeMap::new(),
        value => return not_a_collection("object", &value),
    };
    let (keys, parents): (Vec<_>, Vec<_>) = items.into_iter().map(|(k, v)| (k, cast(v))).unzip();
    Derivation::map(parents, move |values| {
        AccessorState::Resolved(Value::Object(keys.iter().cloned().zip(values).collect()))
    })
}

fn not_a_collection(expected: &'static str, value: &Value) -> Accessor {
    let error = Error::NotACollection {
        expected,
        found: value.type_name(),
    };
    Derivation::map(std::iter::empty(), move |_| {
        AccessorState::Errored(Causes::new(error.clone()))
    })
}

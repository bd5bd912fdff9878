use std::{collections::BTreeMap, fmt};

use crate::{
    core::Capability,
    derive::{Derivation, Rule},
    Accessor, AccessorKind, AccessorState, Error, Value,
};


/// A dot separated path into an object, such as `.person.first`.
///
/// Empty segments are ignored, so the leading dot is optional.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PropertyPath(Vec<String>);

impl PropertyPath {
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Reads the value at this path, or `None` if any segment is absent.
    pub fn lookup(&self, root: &Value) -> Option<Value> {
        let mut value = root.clone();
        for key in &self.0 {
            value = value.child(key)?;
        }
        Some(value)
    }

    /// Writes `value` at this path, creating missing intermediate objects.
    pub fn assign(&self, root: &mut Value, value: Value) {
        assign(root, &self.0, value);
    }
}
impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.0 {
            write!(f, ".{s}")?;
        }
        Ok(())
    }
}

fn assign(target: &mut Value, path: &[String], value: Value) {
    let Some((key, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    let index = key.parse::<usize>().ok();
    if let Value::Array(items) = target {
        // Only an existing slot or a plain append keeps the array.
        if !index.is_some_and(|index| index <= items.len()) {
            let object = items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect();
            *target = Value::Object(object);
        }
    }
    if !target.is_object() {
        *target = Value::Object(BTreeMap::new());
    }
    let slot = match (target, index) {
        (Value::Array(items), Some(index)) => {
            if index == items.len() {
                items.push(Value::Undefined);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(key.clone()).or_insert(Value::Undefined),
        _ => return,
    };
    assign(slot, rest, value);
}

struct PropertyCapability {
    parent: Accessor,
    path: PropertyPath,
}

impl Capability for PropertyCapability {
    fn kind(&self) -> AccessorKind {
        AccessorKind::Property
    }
    fn is_settable(&self) -> bool {
        self.parent.is_settable()
    }
    fn set(&self, _this: &Accessor, value: Value) -> Result<(), Error> {
        if !self.parent.is_settable() {
            return Err(Error::InvalidOperation(self.parent.kind()));
        }
        let mut root = match self.parent.state() {
            AccessorState::Resolved(root) if root.is_object() => root,
            _ => Value::object(),
        };
        self.path.assign(&mut root, value);
        self.parent.set(root)
    }
}

impl Accessor {
    /// Returns an accessor reading and writing the value at `path` inside this accessor's object.
    ///
    /// It is unresolved while any segment of the path is absent.
    /// Setting it writes the updated object back to this accessor,
    /// creating missing intermediate objects.
    pub fn property(&self, path: &str) -> Accessor {
        let path = PropertyPath::parse(path);
        let lookup = path.clone();
        Derivation::build(
            [self.clone()],
            Rule::Map(Box::new(move |values| match lookup.lookup(&values[0]) {
                Some(value) => AccessorState::Resolved(value),
                None => AccessorState::Unresolved,
            })),
            PropertyCapability {
                parent: self.clone(),
                path,
            },
        )
    }
}

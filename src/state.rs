use crate::{
    core::Capability,
    derive::{Derivation, Rule},
    Accessor, AccessorKind, AccessorState, Error, Value,
};


struct StateCapability;

impl Capability for StateCapability {
    fn kind(&self) -> AccessorKind {
        AccessorKind::State
    }
    fn is_settable(&self) -> bool {
        true
    }
    fn set(&self, this: &Accessor, value: Value) -> Result<(), Error> {
        this.resolve(value);
        Ok(())
    }
}

struct ConstantCapability;

impl Capability for ConstantCapability {
    fn kind(&self) -> AccessorKind {
        AccessorKind::Constant
    }
}

/// Creates a settable accessor.
///
/// A plain value becomes the initial resolved value (`()` resolves to [`Value::Undefined`]).
/// An accessor makes the new state mirror it. A local [`set`](Accessor::set) overrides the value
/// until the source transitions again; the binding only flows from the source to the new state.
pub fn state(value: impl Into<Value>) -> Accessor {
    match value.into() {
        Value::Accessor(source) => Derivation::build(
            [source],
            Rule::Map(Box::new(|mut values| {
                AccessorState::Resolved(values.swap_remove(0))
            })),
            StateCapability,
        ),
        value => Accessor::from_parts(AccessorState::Resolved(value), StateCapability),
    }
}

/// Creates a settable accessor that starts unresolved.
pub fn state_empty() -> Accessor {
    Accessor::from_parts(AccessorState::Unresolved, StateCapability)
}

/// Creates an accessor fixed to `value`. It never transitions and cannot be set.
pub fn constant(value: impl Into<Value>) -> Accessor {
    Accessor::from_parts(AccessorState::Resolved(value.into()), ConstantCapability)
}

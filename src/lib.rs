//! A reactive dataflow graph whose nodes, called accessors, are unresolved, resolved, or errored.
//!
//! Mutating a root accessor (a [`state`]) synchronously recomputes every accessor derived from it,
//! depth first, in the same call stack.
//!
//! ```
//! use accessor_frp::{join, state, Value};
//!
//! let a = state(1);
//! let b = state(2);
//! let sum = join([&a, &b], |v| v[0].as_f64().unwrap_or(0.0) + v[1].as_f64().unwrap_or(0.0));
//! assert_eq!(sum.get(), Value::from(3));
//!
//! b.unresolve();
//! assert!(sum.state().is_unresolved());
//!
//! b.set(10).unwrap();
//! assert_eq!(sum.get(), Value::from(11));
//! ```

mod combinators;
mod core;
mod delay;
mod derive;
mod error;
mod ops;
mod promise;
mod property;
mod runtime;
mod state;
mod value;

pub use combinators::*;
pub use core::{Accessor, AccessorKind, AccessorState};
pub use error::*;
pub use promise::*;
pub use property::PropertyPath;
pub use runtime::{Clock, Runtime};
pub use state::*;
pub use value::*;

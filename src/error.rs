use std::{fmt, ops::Deref, rc::Rc};

use parse_display::Display;

use crate::AccessorKind;


/// Errors reported synchronously to the caller, or carried as a [`Cause`] by an errored accessor.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Error {
    #[display("`set` is not supported by {0} accessors")]
    InvalidOperation(AccessorKind),

    #[display("expected {expected}, found {found}")]
    NotACollection {
        expected: &'static str,
        found: &'static str,
    },

    #[display("`Runtime` is not created")]
    RuntimeNotCreated,
}

impl std::error::Error for Error {}

/// A single reason an accessor is errored.
///
/// Clones share the same underlying error.
#[derive(Clone)]
pub struct Cause(Rc<dyn std::error::Error + 'static>);

impl Cause {
    pub fn new(error: impl std::error::Error + 'static) -> Self {
        Self(Rc::new(error))
    }

    /// Creates a cause from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(Message(message.to_string()))
    }

    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }

    pub fn as_error(&self) -> &(dyn std::error::Error + 'static) {
        &*self.0
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }
}
impl<E: std::error::Error + 'static> From<E> for Cause {
    fn from(error: E) -> Self {
        Self::new(error)
    }
}
impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
impl PartialEq for Cause {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

#[derive(Debug, Display)]
#[display("{0}")]
struct Message(String);

impl std::error::Error for Message {}

/// The ordered, non-empty list of causes carried by an errored accessor.
///
/// When several parents are errored at once their causes are concatenated in parent order.
#[derive(Clone, Debug, PartialEq)]
pub struct Causes(Vec<Cause>);

impl Causes {
    pub fn new(cause: impl Into<Cause>) -> Self {
        Self(vec![cause.into()])
    }

    /// Concatenates causes, returning `None` if there are none.
    pub fn concat(items: impl IntoIterator<Item = Causes>) -> Option<Self> {
        let causes: Vec<Cause> = items.into_iter().flat_map(|c| c.0).collect();
        if causes.is_empty() {
            None
        } else {
            Some(Self(causes))
        }
    }

    pub fn first(&self) -> &Cause {
        &self.0[0]
    }
    pub fn into_vec(self) -> Vec<Cause> {
        self.0
    }
}
impl Deref for Causes {
    type Target = [Cause];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Cause> for Causes {
    fn from(cause: Cause) -> Self {
        Self(vec![cause])
    }
}
impl fmt::Display for Causes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, "; ")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

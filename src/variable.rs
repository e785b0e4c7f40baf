use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Value held by a variable
pub type Natural = u32;

/// Largest value a variable may hold. Matches the `int` of every target the
/// emitters write to.
pub const MAX_VALUE: Natural = i32::MAX as Natural;

struct Slot {
    name: String,
    value: Cell<Option<Natural>>,
}

/// A named natural-number cell, uninitialised until its first write.
///
/// Cloning produces another handle to the same cell, so every command that
/// names the variable observes the same value.
#[derive(Clone)]
pub struct Variable(Rc<Slot>);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(Rc::new(Slot {
            name: name.into(),
            value: Cell::new(None),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn value(&self) -> Option<Natural> {
        self.0.value.get()
    }

    pub fn is_initialised(&self) -> bool {
        self.value().is_some()
    }

    pub fn set(&self, value: Natural) {
        self.assign(Some(value));
    }

    pub fn clear(&self) {
        self.assign(Some(0));
    }

    /// Overwrite the value, including back to uninitialised.
    pub fn assign(&self, value: Option<Natural>) {
        debug_assert!(value.map_or(true, |v| v <= MAX_VALUE));
        self.0.value.set(value);
    }

    /// True when both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}={}", self.name(), v),
            None => write!(f, "{}=<uninit>", self.name()),
        }
    }
}

//! Boolean configuration flags and per-component attribute registries.
//!
//! Components that want their knobs discoverable register [`ConfigFlag`]
//! handles on their [`AttributeSet`]. Flags are shared by handle: flipping
//! one handle is visible through every other handle to the same flag, so a
//! component can keep one handle for its own checks while exposing another
//! through the registry.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A named boolean flag shared by handle.
#[derive(Debug, Clone)]
pub struct ConfigFlag {
    name: Rc<str>,
    value: Rc<Cell<bool>>,
}

impl ConfigFlag {
    /// Create a flag with an initial value.
    pub fn new(name: impl Into<String>, initial: bool) -> Self {
        Self {
            name: name.into().into(),
            value: Rc::new(Cell::new(initial)),
        }
    }

    /// Flag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    pub fn get(&self) -> bool {
        self.value.get()
    }

    /// Set the value, visible through every handle to this flag.
    pub fn set(&self, value: bool) {
        self.value.set(value);
    }
}

/// Registry of the flags attached to one component.
#[derive(Debug, Default)]
pub struct AttributeSet {
    flags: RefCell<Vec<ConfigFlag>>,
}

impl AttributeSet {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flag handle.
    ///
    /// Returns `false` (and registers nothing) when a flag with the same
    /// name is already present.
    pub fn register(&self, flag: ConfigFlag) -> bool {
        let mut flags = self.flags.borrow_mut();
        if flags.iter().any(|f| f.name() == flag.name()) {
            return false;
        }
        flags.push(flag);
        true
    }

    /// Look up a flag handle by name.
    pub fn get(&self, name: &str) -> Option<ConfigFlag> {
        self.flags.borrow().iter().find(|f| f.name() == name).cloned()
    }

    /// Names of all registered flags, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.flags
            .borrow()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Number of registered flags.
    pub fn len(&self) -> usize {
        self.flags.borrow().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.flags.borrow().is_empty()
    }
}

//! Runtime environment for variable scopes.
//!
//! Functions hold their defining environment through `Rc<RefCell<_>>`, so
//! every closure created in a scope sees later writes to it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Object;

/// A runtime environment containing variable bindings.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_enclosed(outer: Rc<RefCell<Environment>>) -> Self {
        Self {
            store: HashMap::new(),
            outer: Some(outer),
        }
    }

    /// Wrap in the shared handle functions capture.
    pub fn into_shared(self) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(self))
    }

    /// Get a variable's value, searching up the scope chain.
    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        if let Some(ref outer) = self.outer {
            return outer.borrow().get(name);
        }
        None
    }

    /// Bind a name in this scope, shadowing any outer binding.
    pub fn set(&mut self, name: impl Into<String>, value: Object) -> Object {
        self.store.insert(name.into(), value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_walks_outward() {
        let outer = Environment::new().into_shared();
        outer.borrow_mut().set("x", Object::Integer(1));

        let inner = Environment::new_enclosed(outer.clone());
        assert_eq!(inner.get("x"), Some(Object::Integer(1)));
        assert_eq!(inner.get("y"), None);
    }

    #[test]
    fn test_set_shadows_outer() {
        let outer = Environment::new().into_shared();
        outer.borrow_mut().set("x", Object::Integer(1));

        let mut inner = Environment::new_enclosed(outer.clone());
        inner.set("x", Object::Integer(2));
        assert_eq!(inner.get("x"), Some(Object::Integer(2)));
        assert_eq!(outer.borrow().get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn test_enclosed_scopes_observe_later_outer_writes() {
        let outer = Environment::new().into_shared();
        let first = Environment::new_enclosed(outer.clone());
        let second = Environment::new_enclosed(outer.clone());

        outer.borrow_mut().set("counter", Object::Integer(5));
        assert_eq!(first.get("counter"), Some(Object::Integer(5)));
        assert_eq!(second.get("counter"), Some(Object::Integer(5)));
    }
}

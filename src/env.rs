//! Lexical environments: the name-to-value bindings a running program sees.
//!
//! A flat map plus an optional parent link. `var` always writes into the current frame; only
//! function calls create a new frame (see [`crate::eval`]) — `if`/`for`/block bodies reuse
//! the caller's.

use std::collections::HashMap;
use std::rc::Rc;
use std::cell::RefCell;

use crate::error::EvalError;
use crate::value::Value;

/// Shared handle to an [`Environment`]. Closures hold a clone of this, which is how a `func`
/// value keeps its defining scope alive after the scope that created it returns.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One frame of bindings, optionally chained to an enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<EnvRef>,
}

impl Environment {
    /// A fresh, top-level environment with no parent.
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A new frame enclosed by `outer`, used when calling a function.
    pub fn new_enclosed(outer: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    /// Looks up `name`, walking outward through enclosing frames.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref()?.borrow().get(name)
    }

    /// Binds `name` to `value` in *this* frame, declaring it if new and overwriting it otherwise.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }

    /// Rebinds an already-declared name.
    ///
    /// Unlike [`Environment::get`], this does not walk outer frames: assignment only succeeds if
    /// `name` is already bound in *this* frame, and fails otherwise rather than reaching outward
    /// to find it. This is a deliberately preserved language quirk, not a bug: assigning inside a
    /// `for` body to a name declared in the enclosing function is an error, not a write-through
    /// to the outer binding.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EvalError> {
        if !self.store.contains_key(name) {
            return Err(EvalError::UndefinedAssignTarget {
                name: name.to_string(),
            });
        }
        self.store.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_outer_frames() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Value::Integer(1));
        let inner = Environment::new_enclosed(outer.clone());
        assert!(matches!(inner.borrow().get("x"), Some(Value::Integer(1))));
    }

    #[test]
    fn assign_does_not_reach_outer_frame() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Value::Integer(1));
        let inner = Environment::new_enclosed(outer.clone());

        assert!(inner.borrow_mut().assign("x", Value::Integer(2)).is_err());
        assert!(matches!(outer.borrow().get("x"), Some(Value::Integer(1))));
    }

    #[test]
    fn assign_succeeds_when_name_bound_in_current_frame() {
        let env = Environment::new();
        env.borrow_mut().set("x", Value::Integer(1));
        env.borrow_mut().assign("x", Value::Integer(2)).unwrap();
        assert!(matches!(env.borrow().get("x"), Some(Value::Integer(2))));
    }

    #[test]
    fn set_overwrites_current_frame() {
        let env = Environment::new();
        env.borrow_mut().set("x", Value::Integer(1));
        env.borrow_mut().set("x", Value::Integer(2));
        assert!(matches!(env.borrow().get("x"), Some(Value::Integer(2))));
    }

    #[test]
    fn get_missing_name_is_none() {
        let env = Environment::new();
        assert!(env.borrow().get("missing").is_none());
    }
}

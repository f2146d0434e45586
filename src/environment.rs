//! Runtime scope frames.
//!
//! A frame maps names to values and optionally links to its lexically
//! enclosing frame.  Frames are `Rc<RefCell<…>>`-shared: a closure may
//! keep a frame alive arbitrarily long after its defining block exits,
//! and multiple closures may alias and mutate the same frame.  Frames
//! only ever point to strict ancestors, so reference cycles cannot occur.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in *this* frame.  Rejects a second live binding for the
    /// same name in the same frame; shadowing an enclosing frame's binding
    /// is legal and intentional.
    pub fn define(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.values.contains_key(name) {
            return Err(format!(
                "Cannot redefine variable '{}'; it is already defined in this scope.",
                name
            ));
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind an implicit name (`this`, `super`, parameters, natives) into a
    /// frame the interpreter just created, where a collision is impossible
    /// by construction.
    pub(crate) fn define_implicit(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Value bound to `name` in the nearest frame, walking the parent
    /// chain.  Used only for globals; resolved locals go through
    /// [`Environment::get_at`].
    pub fn get(&self, name: &str) -> Result<Value, String> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// Same walk as [`Environment::get`] but mutates the first frame where
    /// `name` is found.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// Walk up the parent chain exactly `distance` links, stopping early
    /// if the chain is shorter.  The clamp is defensive; it never triggers
    /// on resolver-produced distances.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Rc<RefCell<Environment>> {
        let mut current = env.clone();

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone();

            match next {
                Some(enclosing) => current = enclosing,
                None => break,
            }
        }

        current
    }

    /// Fast path driven by the resolver's hop counts: jump exactly
    /// `distance` frames and read `name` from that frame only, never
    /// searching.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
    ) -> Result<Value, String> {
        Self::ancestor(env, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| format!("Undefined variable '{}'.", name))
    }

    /// Counterpart of [`Environment::get_at`] for assignment.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> Result<(), String> {
        let target = Self::ancestor(env, distance);
        let mut frame = target.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("Undefined variable '{}'.", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn define_then_get() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0)).unwrap();

        assert_eq!(env.get("a").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn redefinition_in_same_frame_is_rejected() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0)).unwrap();

        assert!(env.define("a", Value::Number(2.0)).is_err());
    }

    #[test]
    fn shadowing_across_frames_is_legal() {
        let outer = shared(Environment::new());
        outer
            .borrow_mut()
            .define("a", Value::Number(1.0))
            .unwrap();

        let mut inner = Environment::with_enclosing(outer.clone());
        inner.define("a", Value::Number(2.0)).unwrap();

        assert_eq!(inner.get("a").unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get("a").unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_to_the_defining_frame() {
        let outer = shared(Environment::new());
        outer
            .borrow_mut()
            .define("a", Value::Number(1.0))
            .unwrap();

        let mut inner = Environment::with_enclosing(outer.clone());
        inner.assign("a", Value::Number(5.0)).unwrap();

        assert_eq!(outer.borrow().get("a").unwrap(), Value::Number(5.0));
    }

    #[test]
    fn assign_to_undefined_name_fails() {
        let mut env = Environment::new();

        assert!(env.assign("ghost", Value::Null).is_err());
    }

    #[test]
    fn get_at_jumps_exactly_the_requested_distance() {
        let root = shared(Environment::new());
        root.borrow_mut()
            .define("a", Value::String("root".to_string()))
            .unwrap();

        let mid = shared(Environment::with_enclosing(root));
        mid.borrow_mut()
            .define("a", Value::String("mid".to_string()))
            .unwrap();

        let leaf = shared(Environment::with_enclosing(mid));

        assert_eq!(
            Environment::get_at(&leaf, 1, "a").unwrap(),
            Value::String("mid".to_string())
        );
        assert_eq!(
            Environment::get_at(&leaf, 2, "a").unwrap(),
            Value::String("root".to_string())
        );

        // get_at never searches: distance 0 frame has no binding.
        assert!(Environment::get_at(&leaf, 0, "a").is_err());
    }

    #[test]
    fn ancestor_clamps_on_short_chains() {
        let root = shared(Environment::new());
        root.borrow_mut().define("a", Value::Null).unwrap();

        let clamped = Environment::ancestor(&root, 10);

        assert!(clamped.borrow().get("a").is_ok());
    }
}

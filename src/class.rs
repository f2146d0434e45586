//! The object model: classes with single inheritance, and instances.

use std::collections::HashMap;
use std::rc::Rc;

use crate::function::UserFunction;
use crate::value::Value;

/// A class value: name, optional superclass, and the (unbound) method
/// tables.  Instance methods are looked up along the superclass chain;
/// static methods belong to the declaring class only.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<UserFunction>>,
    statics: HashMap<String, Rc<UserFunction>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<UserFunction>>,
        statics: HashMap<String, Rc<UserFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
            statics,
        }
    }

    /// Walk this class then its superclass chain for an instance method.
    pub fn find_method(&self, name: &str) -> Option<Rc<UserFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Static methods are not inherited; only the declaring class's table
    /// is consulted.
    pub fn find_static(&self, name: &str) -> Option<Rc<UserFunction>> {
        self.statics.get(name).cloned()
    }

    /// A class's arity equals its initializer's arity, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map_or(0, |initializer| initializer.arity())
    }
}

/// A live object: its originating class plus a mutable field map.
/// Created only by calling a class value.
#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<Class> {
        &self.class
    }

    /// Fields shadow methods, so property access checks here first.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

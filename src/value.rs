//! Runtime value model: a closed sum type over everything a Quill
//! expression can evaluate to.
//!
//! `Callable` and `Instance` variants are reference-counted so multiple
//! bindings can alias the same function or object; every call dispatch is
//! an exhaustive match rather than a runtime type test.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::function::{NativeFunction, UserFunction};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<RefCell<Instance>>),
}

/// The three concrete kinds of callable value, dispatched uniformly
/// through arity check + invocation in the evaluator.
#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<UserFunction>),
    Class(Rc<Class>),
}

impl Callable {
    /// Declared parameter count; for a class, its initializer's arity
    /// (or 0 without one).
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Display name used in arity-mismatch errors.
    pub fn name(&self) -> String {
        match self {
            Callable::Native(native) => native.name.to_string(),
            Callable::Function(function) => function
                .name()
                .map_or_else(|| "<anonymous fn>".to_string(), str::to_string),
            Callable::Class(class) => class.name.clone(),
        }
    }
}

impl Value {
    /// Quill follows Ruby's simple rule: `false` and `null` are falsy,
    /// everything else (including `0` and `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }
}

impl PartialEq for Value {
    /// Operator equality for `==` / `!=`.  Values of different underlying
    /// kinds are never equal; callables and instances are never equal
    /// under this operator (reference identity is not exposed).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            // Numbers without a fractional part render as integers; this
            // is also the trailing-zero-trimmed form used by string
            // concatenation (1.50 → "1.5", 3.0 → "3").
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Native(native)) => {
                write!(f, "<native fn {}>", native.name)
            }

            Value::Callable(Callable::Function(function)) => match function.name() {
                Some(name) => write!(f, "<fn {}>", name),
                None => write!(f, "<fn>"),
            },

            Value::Callable(Callable::Class(class)) => write!(f, "<class {}>", class.name),

            Value::Instance(instance) => {
                write!(f, "<instance of {}>", instance.borrow().class().name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(1.50).to_string(), "1.5");
        assert_eq!(Value::Number(-4.0).to_string(), "-4");
    }

    #[test]
    fn null_and_false_are_falsy_everything_else_truthy() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
    }

    #[test]
    fn equality_is_by_value_within_one_kind() {
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::String("1".to_string()));
        assert_ne!(Value::Bool(false), Value::Null);
    }
}

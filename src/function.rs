//! Function values: user-defined closures and host-provided natives.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class::Instance;
use crate::environment::Environment;
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A host function exposed to Quill programs through the same callable
/// contract (name, arity, invocation) as user-defined functions, so call
/// dispatch needs no special-casing.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

/// A user-defined function: an immutable reference to its declaration
/// plus the environment frame captured at *definition* time.
#[derive(Debug)]
pub struct UserFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,

    /// Initializers implicitly return the receiver bound to `this` in
    /// the closure's first frame, regardless of explicit `return`.
    pub is_initializer: bool,
}

impl UserFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// `None` for anonymous functions.
    pub fn name(&self) -> Option<&str> {
        self.declaration
            .name
            .as_ref()
            .map(|token| token.lexeme.as_str())
    }

    /// Produce a copy of this function whose closure has `this` bound to
    /// `instance`, layered on the original captured environment.  Method
    /// access and `super` dispatch both go through here.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> UserFunction {
        let mut frame = Environment::with_enclosing(self.closure.clone());
        frame.define_implicit("this", Value::Instance(instance));

        UserFunction::new(
            self.declaration.clone(),
            Rc::new(RefCell::new(frame)),
            self.is_initializer,
        )
    }
}

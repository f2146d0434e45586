//! The tree-walking evaluator.
//!
//! Control flow is modelled explicitly: every statement reports how
//! execution should continue via [`Signal`], so `return` and `break`
//! propagate through ordinary `Result` values instead of unwinding.
//! Loops absorb `Break`; function calls absorb `Return`.  The resolver
//! guarantees neither can legally reach the top level, so an escaped
//! signal surfaces as [`QuillError::Internal`].
//!
//! Variable references resolved during the static pass are read through
//! [`Environment::get_at`] with the recorded hop count; only globals fall
//! back to a chain search.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{QuillError, Result};
use crate::expr::Expr;
use crate::function::UserFunction;
use crate::natives;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{Callable, Value};

/// How execution should continue after a statement.
#[derive(Debug)]
pub enum Signal {
    /// Fall through to the next statement.
    Next,

    /// A `return` is propagating toward the nearest function call.
    Return(Value),

    /// A `break` is propagating toward the nearest loop.
    Break,
}

pub struct Interpreter {
    /// The global frame; natives live here and the REPL reuses it.
    pub globals: Rc<RefCell<Environment>>,

    /// The frame statements currently execute in.
    environment: Rc<RefCell<Environment>>,

    /// Resolver output: reference node id → hop count to the defining
    /// frame.  Absent ids are globals.
    locals: HashMap<usize, usize>,

    /// Sink for `print`; swapped for a buffer in tests.
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Build an interpreter writing `print` output to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        natives::install(&globals);

        info!("Interpreter created; natives installed");

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved reference: the resolver calls this once per
    /// local reference node it can see the declaration of.
    pub fn resolve_local(&mut self, id: usize, depth: usize) {
        debug!("Resolved node {} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Execute a whole program.  A control-flow signal reaching this
    /// level indicates a resolver bug.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Beginning execution of {} statements", statements.len());

        for statement in statements {
            match self.execute(statement)? {
                Signal::Next => {}
                Signal::Return(_) => {
                    return Err(QuillError::Internal(
                        "'return' signal escaped to the top level".to_string(),
                    ));
                }
                Signal::Break => {
                    return Err(QuillError::Internal(
                        "'break' signal escaped to the top level".to_string(),
                    ));
                }
            }
        }

        self.output.flush()?;

        Ok(())
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Signal::Next)
            }

            Stmt::Print { value, .. } => {
                let rendered: String = match value {
                    Some(expr) => stringify_for_print(&self.evaluate(expr)?),
                    None => String::new(),
                };

                writeln!(self.output, "{}", rendered)?;
                self.output.flush()?;

                Ok(Signal::Next)
            }

            Stmt::Let { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value)
                    .map_err(|msg| QuillError::runtime(name.line, msg))?;

                Ok(Signal::Next)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(frame)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Next)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Signal::Next => {}
                        Signal::Break => break,
                        Signal::Return(value) => return Ok(Signal::Return(value)),
                    }
                }

                Ok(Signal::Next)
            }

            Stmt::Function(declaration) => {
                let function = UserFunction::new(
                    declaration.clone(),
                    self.environment.clone(),
                    false,
                );
                let name: &Token = declaration
                    .name
                    .as_ref()
                    .ok_or_else(|| {
                        QuillError::Internal(
                            "function declaration statement without a name".to_string(),
                        )
                    })?;

                self.environment
                    .borrow_mut()
                    .define(
                        &name.lexeme,
                        Value::Callable(Callable::Function(Rc::new(function))),
                    )
                    .map_err(|msg| QuillError::runtime(name.line, msg))?;

                Ok(Signal::Next)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };

                Ok(Signal::Return(value))
            }

            Stmt::Break { .. } => Ok(Signal::Break),

            Stmt::Class {
                name,
                superclass,
                methods,
                statics,
            } => self.execute_class(name, superclass.as_ref(), methods, statics),
        }
    }

    /// Run `statements` inside `frame`, restoring the previous frame
    /// afterwards whether execution succeeded or not.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: Rc<RefCell<Environment>>,
    ) -> Result<Signal> {
        let previous = mem::replace(&mut self.environment, frame);

        let mut result: Result<Signal> = Ok(Signal::Next);

        for statement in statements {
            match self.execute(statement) {
                Ok(Signal::Next) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        statics: &[Rc<FunctionDecl>],
    ) -> Result<Signal> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),
                _ => {
                    return Err(QuillError::runtime(
                        expr.line(),
                        "Superclass must be a class.",
                    ));
                }
            },
            None => None,
        };

        // Bind the name before the body so methods can refer to the class,
        // then fill the binding in once the class value exists.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Null)
            .map_err(|msg| QuillError::runtime(name.line, msg))?;

        // Methods of a subclass close over a frame holding `super`.
        let method_closure: Rc<RefCell<Environment>> = match &superclass {
            Some(parent) => {
                let mut frame = Environment::with_enclosing(self.environment.clone());

                frame.define_implicit(
                    "super",
                    Value::Callable(Callable::Class(parent.clone())),
                );

                Rc::new(RefCell::new(frame))
            }
            None => self.environment.clone(),
        };

        let mut method_table: HashMap<String, Rc<UserFunction>> = HashMap::new();

        for declaration in methods {
            let method_name: &Token = declaration.name.as_ref().ok_or_else(|| {
                QuillError::Internal("method declaration without a name".to_string())
            })?;
            let is_initializer: bool = method_name.lexeme == "init";

            method_table.insert(
                method_name.lexeme.clone(),
                Rc::new(UserFunction::new(
                    declaration.clone(),
                    method_closure.clone(),
                    is_initializer,
                )),
            );
        }

        let mut static_table: HashMap<String, Rc<UserFunction>> = HashMap::new();

        for declaration in statics {
            let static_name: &Token = declaration.name.as_ref().ok_or_else(|| {
                QuillError::Internal("static method declaration without a name".to_string())
            })?;

            // Statics never see `this` or `super`, so they close over the
            // declaring frame directly; the `super` frame would shift
            // every resolved hop count by one.
            static_table.insert(
                static_name.lexeme.clone(),
                Rc::new(UserFunction::new(
                    declaration.clone(),
                    self.environment.clone(),
                    false,
                )),
            );
        }

        let class = Class::new(
            name.lexeme.clone(),
            superclass,
            method_table,
            static_table,
        );

        self.environment
            .borrow_mut()
            .assign(
                &name.lexeme,
                Value::Callable(Callable::Class(Rc::new(class))),
            )
            .map_err(|msg| QuillError::runtime(name.line, msg))?;

        Ok(Signal::Next)
    }

    // ───────────────────────── expressions ────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => literal_value(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(QuillError::runtime(
                            operator.line,
                            "Operand must be a number.",
                        )),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(QuillError::Internal(format!(
                        "invalid unary operator '{}'",
                        operator.lexeme
                    ))),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                self.evaluate_binary(left, operator, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits: bool = match operator.token_type {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    )
                    .map_err(|msg| QuillError::runtime(name.line, msg))?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone())
                        .map_err(|msg| QuillError::runtime(name.line, msg))?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args, paren)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        // Fields shadow methods.
                        if let Some(value) = instance.borrow().get_field(&name.lexeme) {
                            return Ok(value);
                        }

                        let class: Rc<Class> = instance.borrow().class().clone();

                        match class.find_method(&name.lexeme) {
                            Some(method) => Ok(Value::Callable(Callable::Function(
                                Rc::new(method.bind(instance.clone())),
                            ))),
                            None => Err(QuillError::runtime(
                                name.line,
                                format!("Undefined property '{}'.", name.lexeme),
                            )),
                        }
                    }

                    Value::Callable(Callable::Class(class)) => {
                        match class.find_static(&name.lexeme) {
                            Some(method) => {
                                Ok(Value::Callable(Callable::Function(method)))
                            }
                            None => Err(QuillError::runtime(
                                name.line,
                                format!(
                                    "Undefined static method '{}' on class '{}'.",
                                    name.lexeme, class.name
                                ),
                            )),
                        }
                    }

                    _ => Err(QuillError::runtime(
                        name.line,
                        "Only instances have properties.",
                    )),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(QuillError::runtime(
                        name.line,
                        "Only instances have fields.",
                    ));
                };

                let value: Value = self.evaluate(value)?;
                instance
                    .borrow_mut()
                    .set_field(&name.lexeme, value.clone());

                Ok(value)
            }

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),

            Expr::Super { keyword, method, id } => {
                let distance: usize = *self.locals.get(id).ok_or_else(|| {
                    QuillError::Internal("unresolved 'super' reference".to_string())
                })?;

                let superclass: Value =
                    Environment::get_at(&self.environment, distance, "super")
                        .map_err(|msg| QuillError::runtime(keyword.line, msg))?;
                let Value::Callable(Callable::Class(superclass)) = superclass else {
                    return Err(QuillError::Internal(
                        "'super' is not bound to a class".to_string(),
                    ));
                };

                // The receiver frame sits one hop below the `super` frame.
                let receiver: Value =
                    Environment::get_at(&self.environment, distance - 1, "this")
                        .map_err(|msg| QuillError::runtime(keyword.line, msg))?;
                let Value::Instance(receiver) = receiver else {
                    return Err(QuillError::Internal(
                        "'this' is not bound to an instance".to_string(),
                    ));
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                        found.bind(receiver),
                    )))),
                    None => Err(QuillError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }

            Expr::Lambda(declaration) => {
                Ok(Value::Callable(Callable::Function(Rc::new(
                    UserFunction::new(declaration.clone(), self.environment.clone(), false),
                ))))
            }
        }
    }

    fn evaluate_binary(&mut self, left: Value, operator: &Token, right: Value) -> Result<Value> {
        let line: usize = operator.line;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }

                // A number next to a string coerces via its printed form
                // (trailing zeroes trimmed); no other mix is accepted.
                (Value::String(s), Value::Number(n)) => {
                    Ok(Value::String(format!("{}{}", s, Value::Number(n))))
                }
                (Value::Number(n), Value::String(s)) => {
                    Ok(Value::String(format!("{}{}", Value::Number(n), s)))
                }

                _ => Err(QuillError::runtime(
                    line,
                    "Operands must be numbers or strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = numeric_operands(&left, &right, line)?;

                if b == 0.0 {
                    return Err(QuillError::DivisionByZero { line });
                }

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = numeric_operands(&left, &right, line)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(QuillError::Internal(format!(
                "invalid binary operator '{}'",
                operator.lexeme
            ))),
        }
    }

    // ────────────────────────── dispatch ──────────────────────────

    /// Invoke any callable value, after checking arity against the
    /// declared count.
    pub fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        let Value::Callable(callable) = callee else {
            return Err(QuillError::runtime(
                paren.line,
                "Can only call functions and classes.",
            ));
        };

        if args.len() != callable.arity() {
            return Err(QuillError::runtime(
                paren.line,
                format!(
                    "Expected {} arguments but got {} in call to '{}'.",
                    callable.arity(),
                    args.len(),
                    callable.name()
                ),
            ));
        }

        match callable {
            Callable::Native(native) => {
                debug!("Calling native '{}'", native.name);

                (native.func)(&args).map_err(|msg| QuillError::runtime(paren.line, msg))
            }

            Callable::Function(function) => self.call_function(&function, args),

            Callable::Class(class) => self.instantiate(class, args),
        }
    }

    /// Run a user function body in a fresh frame layered on its closure.
    fn call_function(&mut self, function: &UserFunction, args: Vec<Value>) -> Result<Value> {
        let mut frame = Environment::with_enclosing(function.closure.clone());

        for (param, arg) in function.declaration.params.iter().zip(args) {
            frame.define_implicit(&param.lexeme, arg);
        }

        let signal: Signal =
            self.execute_block(&function.declaration.body, Rc::new(RefCell::new(frame)))?;

        // An initializer yields the receiver no matter what the body did.
        if function.is_initializer {
            return Environment::get_at(&function.closure, 0, "this")
                .map_err(QuillError::Internal);
        }

        match signal {
            Signal::Return(value) => Ok(value),
            Signal::Next => Ok(Value::Null),
            Signal::Break => Err(QuillError::Internal(
                "'break' signal escaped a function body".to_string(),
            )),
        }
    }

    /// Calling a class builds an instance and runs `init` when present.
    fn instantiate(&mut self, class: Rc<Class>, args: Vec<Value>) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(Instance::new(class.clone())));

        if let Some(initializer) = class.find_method("init") {
            let bound: UserFunction = initializer.bind(instance.clone());

            self.call_function(&bound, args)?;
        }

        Ok(Value::Instance(instance))
    }

    fn look_up_variable(&mut self, name: &Token, id: usize) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme)
                    .map_err(|msg| QuillError::runtime(name.line, msg))
            }
            None => self
                .globals
                .borrow()
                .get(&name.lexeme)
                .map_err(|msg| QuillError::runtime(name.line, msg)),
        }
    }
}

/// Convert a literal token into its runtime value.
fn literal_value(token: &Token) -> Result<Value> {
    match &token.token_type {
        TokenType::NUMBER(n) => Ok(Value::Number(*n)),
        TokenType::STRING(s) => Ok(Value::String(s.clone())),
        TokenType::TRUE => Ok(Value::Bool(true)),
        TokenType::FALSE => Ok(Value::Bool(false)),
        TokenType::NULL => Ok(Value::Null),
        _ => Err(QuillError::Internal(format!(
            "token '{}' is not a literal",
            token.lexeme
        ))),
    }
}

fn numeric_operands(left: &Value, right: &Value, line: usize) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(QuillError::runtime(line, "Operands must be numbers.")),
    }
}

/// Render a value for `print`.  String literals keep their escape
/// sequences raw through the scanner; `\n` and `\t` are interpreted here,
/// at output time only.
fn stringify_for_print(value: &Value) -> String {
    match value {
        Value::String(s) => {
            let mut out = String::with_capacity(s.len());
            let mut chars = s.chars().peekable();

            while let Some(c) = chars.next() {
                if c == '\\' {
                    match chars.peek() {
                        Some('n') => {
                            chars.next();
                            out.push('\n');
                        }
                        Some('t') => {
                            chars.next();
                            out.push('\t');
                        }
                        _ => out.push('\\'),
                    }
                } else {
                    out.push(c);
                }
            }

            out
        }
        other => other.to_string(),
    }
}

//! Static resolution pass.
//!
//! Walks the AST between parsing and execution, mirroring the block
//! structure with a stack of compile-time scopes.  For every local
//! reference it records the hop count from the reference's frame to the
//! defining frame in the interpreter's side table; names that resolve in
//! no scope are globals and get no entry.
//!
//! The pass never aborts: every problem it finds flows into a
//! [`Diagnostics`] accumulator and the walk continues, so one run reports
//! all static errors.  The driver gates execution on the aggregate.
//!
//! Also enforced here, so the evaluator never has to:
//! `return` outside a function, `return` with a value inside `init`,
//! `break` outside a loop, `this`/`super` outside a class or inside a
//! static method, a variable read in its own initializer, duplicate
//! declarations in one scope, and a class inheriting from itself.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::error::Diagnostics;
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body the resolver is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
    Static,
}

/// Whether the resolver is inside a class body, and of what shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// Compile-time knowledge about one declared name.
#[derive(Debug)]
struct Binding {
    /// False between declaration and the end of the initializer.
    defined: bool,

    /// Set on the first read.
    used: bool,

    line: usize,

    /// Only `let` bindings produce unused-variable warnings.
    warn_unused: bool,
}

pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    scopes: Vec<HashMap<String, Binding>>,
    diagnostics: Diagnostics,
    current_function: FunctionKind,
    current_class: ClassKind,

    /// Number of enclosing loops in the *current function*; reset at
    /// every function boundary so `break` cannot cross one.
    loop_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Self {
        Self {
            interpreter,
            scopes: Vec::new(),
            diagnostics: Diagnostics::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            loop_depth: 0,
        }
    }

    /// Resolve a whole program and hand back everything found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Diagnostics {
        info!("Beginning resolution of {} statements", statements.len());

        self.resolve_statements(statements);

        self.diagnostics
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_statement(statement);
        }
    }

    // ───────────────────────── statements ─────────────────────────

    fn resolve_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements);
                self.end_scope();
            }

            Stmt::Let { name, initializer } => {
                self.declare(name, true);

                if let Some(initializer) = initializer {
                    self.resolve_expression(initializer);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                if let Some(name) = &declaration.name {
                    self.declare(name, false);
                    self.define(name);
                }

                self.resolve_function(declaration, FunctionKind::Function);
            }

            Stmt::Expression(expr) => self.resolve_expression(expr),

            Stmt::Print { value, .. } => {
                if let Some(value) = value {
                    self.resolve_expression(value);
                }
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expression(condition);
                self.resolve_statement(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_statement(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expression(condition);

                self.loop_depth += 1;
                self.resolve_statement(body);
                self.loop_depth -= 1;
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionKind::None {
                    self.diagnostics.error(
                        keyword.line,
                        &keyword.lexeme,
                        "Cannot return from top-level code.",
                    );
                }

                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot return a value from an initializer.",
                        );
                    }

                    self.resolve_expression(value);
                }
            }

            Stmt::Break { keyword } => {
                if self.loop_depth == 0 {
                    self.diagnostics.error(
                        keyword.line,
                        &keyword.lexeme,
                        "Cannot use 'break' outside of a loop.",
                    );
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
                statics,
            } => self.resolve_class(name, superclass.as_ref(), methods, statics),
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
        statics: &[Rc<FunctionDecl>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class: ClassKind = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(name, false);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.diagnostics.error(
                        super_name.line,
                        &super_name.lexeme,
                        "A class cannot inherit from itself.",
                    );
                }
            }

            self.current_class = ClassKind::Subclass;
            self.resolve_expression(superclass);

            // Methods of a subclass resolve `super` one frame above `this`.
            self.begin_scope();
            self.declare_implicit("super", name.line);
        }

        self.begin_scope();
        self.declare_implicit("this", name.line);

        for method in methods {
            let kind: FunctionKind = match &method.name {
                Some(method_name) if method_name.lexeme == "init" => FunctionKind::Initializer,
                _ => FunctionKind::Method,
            };

            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        // Static methods resolve outside the `this`/`super` scopes; any
        // reference to either in their bodies is reported, not resolved.
        for static_method in statics {
            self.resolve_function(static_method, FunctionKind::Static);
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionKind) {
        let enclosing_function: FunctionKind =
            std::mem::replace(&mut self.current_function, kind);

        // A loop outside the function does not license `break` inside it.
        let enclosing_loop_depth: usize = std::mem::replace(&mut self.loop_depth, 0);

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param, false);
            self.define(param);
        }

        self.resolve_statements(&declaration.body);

        self.end_scope();

        self.loop_depth = enclosing_loop_depth;
        self.current_function = enclosing_function;
    }

    // ───────────────────────── expressions ────────────────────────

    fn resolve_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expression(inner),

            Expr::Unary { right, .. } => self.resolve_expression(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expression(left);
                self.resolve_expression(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expression(condition);
                self.resolve_expression(then_branch);
                self.resolve_expression(else_branch);
            }

            Expr::Variable { name, id } => {
                if let Some(scope) = self.scopes.last() {
                    if let Some(binding) = scope.get(&name.lexeme) {
                        if !binding.defined {
                            self.diagnostics.error(
                                name.line,
                                &name.lexeme,
                                "Cannot read local variable in its own initializer.",
                            );

                            return;
                        }
                    }
                }

                self.resolve_local(*id, &name.lexeme, true);
            }

            Expr::Assign { name, value, id } => {
                self.resolve_expression(value);

                // A bare write is not a use; unused warnings want reads.
                self.resolve_local(*id, &name.lexeme, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expression(callee);

                for argument in arguments {
                    self.resolve_expression(argument);
                }
            }

            Expr::Get { object, .. } => self.resolve_expression(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expression(object);
                self.resolve_expression(value);
            }

            Expr::This { keyword, id } => {
                match (self.current_class, self.current_function) {
                    (ClassKind::None, _) => {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot use 'this' outside of a class.",
                        );
                    }
                    (_, FunctionKind::Static) => {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot use 'this' in a static method.",
                        );
                    }
                    _ => self.resolve_local(*id, &keyword.lexeme, true),
                }
            }

            Expr::Super { keyword, id, .. } => {
                match (self.current_class, self.current_function) {
                    (ClassKind::None, _) => {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot use 'super' outside of a class.",
                        );
                    }
                    (_, FunctionKind::Static) => {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot use 'super' in a static method.",
                        );
                    }
                    (ClassKind::Class, _) => {
                        self.diagnostics.error(
                            keyword.line,
                            &keyword.lexeme,
                            "Cannot use 'super' in a class with no superclass.",
                        );
                    }
                    _ => self.resolve_local(*id, &keyword.lexeme, true),
                }
            }

            Expr::Lambda(declaration) => {
                // A lambda keeps the enclosing function kind, so a
                // top-level lambda still rejects `return`-with-value rules
                // the same way its surroundings would.
                self.resolve_function(declaration, self.current_function);
            }
        }
    }

    // ─────────────────────── scope machinery ──────────────────────

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, flushing unused-variable warnings for it.
    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            let mut unused: Vec<(String, usize)> = scope
                .into_iter()
                .filter(|(_, binding)| binding.warn_unused && !binding.used)
                .map(|(name, binding)| (name, binding.line))
                .collect();

            // Deterministic warning order for tests and humans alike.
            unused.sort_by_key(|(_, line)| *line);

            for (name, line) in unused {
                self.diagnostics
                    .warning(line, &name, "Local variable is never used.");
            }
        }
    }

    /// Record `name` in the innermost scope as declared but not yet
    /// defined.  Global declarations are not tracked statically.
    fn declare(&mut self, name: &Token, warn_unused: bool) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.diagnostics.error(
                name.line,
                &name.lexeme,
                "Variable with this name already declared in this scope.",
            );

            return;
        }

        scope.insert(
            name.lexeme.clone(),
            Binding {
                defined: false,
                used: false,
                line: name.line,
                warn_unused,
            },
        );
    }

    /// Declare-and-define a name the interpreter binds implicitly.
    fn declare_implicit(&mut self, name: &str, line: usize) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.to_string(),
                Binding {
                    defined: true,
                    used: false,
                    line,
                    warn_unused: false,
                },
            );
        }
    }

    /// Mark `name` as fully initialized in the innermost scope.
    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(binding) = scope.get_mut(&name.lexeme) {
                binding.defined = true;
            }
        }
    }

    /// Find the innermost scope declaring `name` and record the hop count
    /// for the reference node `id`.  No match means the name is (hoped to
    /// be) a global and gets no table entry.
    fn resolve_local(&mut self, id: usize, name: &str, is_read: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(binding) = scope.get_mut(name) {
                if is_read {
                    binding.used = true;
                }

                self.interpreter.resolve_local(id, depth);

                return;
            }
        }
    }
}

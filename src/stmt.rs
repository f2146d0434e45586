use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A function or method declaration shared between the AST and the
/// function values created from it.  `Rc` so a closure can outlive the
/// statement list it was parsed from (REPL lines, dropped programs).
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// `None` for anonymous functions.
    pub name: Option<Token>,

    pub params: Vec<Token>,

    pub body: Vec<Stmt>,

    /// Line of the `fun` keyword (or method name), for error reporting.
    pub line: usize,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a
/// sequence of these nodes returned by the parser; `for` loops are
/// desugared into `While` at parse time.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement; a bare `print;` emits a blank line.
    Print {
        keyword: Token,
        value: Option<Expr>,
    },

    /// Variable declaration: `"let" IDENT ("=" initializer)? ";"`.
    Let {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop (also the desugared form of `for`).
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration, becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for diagnostics).
        keyword: Token,

        /// Optional expression to return.  Absent ⇒ `null` is returned.
        value: Option<Expr>,
    },

    /// `break` out of the nearest enclosing loop.
    Break { keyword: Token },

    /// Class declaration with optional superclass, instance methods and
    /// static methods.
    Class {
        name: Token,

        /// Always an `Expr::Variable` when present, so it participates in
        /// resolution like any other reference.
        superclass: Option<Expr>,

        methods: Vec<Rc<FunctionDecl>>,

        statics: Vec<Rc<FunctionDecl>>,
    },
}

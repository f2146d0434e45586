use std::rc::Rc;

use crate::stmt::FunctionDecl;
use crate::token::Token;

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*
/// in Quill.
///
/// Nodes that name a binding (`Variable`, `Assign`, `This`, `Super`) carry
/// a parser‑assigned `id`, unique per program run.  The resolver keys its
/// hop‑count side‑table on that id; the evaluator consults the table and
/// never recomputes distances from the dynamic frame shape.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `null`.
    Literal(Token),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression, `!ready` or `-42`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix binary operator expression, `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `condition ? then : else`.  The condition is evaluated first and
    /// only the selected branch is evaluated.
    Ternary {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Variable access.
    Variable { name: Token, id: usize },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        name: Token,
        value: Box<Expr>,
        id: usize,
    },

    /// Function‑, method‑ or class‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.property`
    Get { object: Box<Expr>, name: Token },

    /// `object.property = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { keyword: Token, id: usize },

    /// `super.method` inside a subclass method.
    Super {
        keyword: Token,
        method: Token,
        id: usize,
    },

    /// Anonymous function expression: `fun (params) { body }`.
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    /// Source line of the node, for error reporting.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(token) => token.line,

            Expr::Grouping(expr) => expr.line(),

            Expr::Unary { operator, .. } => operator.line,

            Expr::Binary { operator, .. } => operator.line,

            Expr::Logical { operator, .. } => operator.line,

            Expr::Ternary { condition, .. } => condition.line(),

            Expr::Variable { name, .. } => name.line,

            Expr::Assign { name, .. } => name.line,

            Expr::Call { paren, .. } => paren.line,

            Expr::Get { name, .. } => name.line,

            Expr::Set { name, .. } => name.line,

            Expr::This { keyword, .. } => keyword.line,

            Expr::Super { keyword, .. } => keyword.line,

            Expr::Lambda(decl) => decl.line,
        }
    }
}

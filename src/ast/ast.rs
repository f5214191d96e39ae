use crate::Span;

use super::types::{BinaryOp, Type, UnaryOp};

/// A whole compilation unit: the top-level statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement variants
///
/// Consumers match on this exhaustively, so adding a variant is a
/// compile-time checked change everywhere statements are handled.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = value`
    Assign { name: String, value: Expr },
    /// `name: type = value`
    Init {
        name: String,
        type_: Type,
        value: Expr,
    },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        ret: Type,
        body: Vec<Stmt>,
    },
    /// At most one `elif` arm. A missing `else` is an empty body.
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        elif: Option<(Expr, Vec<Stmt>)>,
        else_body: Vec<Stmt>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    Pass,
    Return(Expr),
    Expr(Expr),
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }

    /// `Init` and `FunctionDef` form the declaration prefix of a block.
    pub fn is_declaration(&self) -> bool {
        matches!(self.kind, StmtKind::Init { .. } | StmtKind::FunctionDef { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    None,
    Bool(bool),
    Int(i32),
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call { name: String, args: Vec<Expr> },
    Print(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

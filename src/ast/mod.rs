//! Abstract Syntax Tree for Monkey.
//!
//! The parser that builds these nodes lives outside this crate; the compiler
//! matches on them exhaustively.

pub mod expr;
pub mod stmt;

use std::fmt;

use crate::span::Span;

pub use expr::{BinaryOp, Expr, ExprKind, Identifier, UnaryOp};
pub use stmt::{BlockStatement, Program, Stmt, StmtKind};

/// Any compilable node, borrowed from its owning tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Statement(&'a Stmt),
    Block(&'a BlockStatement),
    Expression(&'a Expr),
}

impl Node<'_> {
    /// Location of the node; a whole program has no single span.
    pub fn span(&self) -> Span {
        match self {
            Node::Program(program) => match (program.statements.first(), program.statements.last())
            {
                (Some(first), Some(last)) => first.span.merge(&last.span),
                _ => Span::default(),
            },
            Node::Statement(stmt) => stmt.span,
            Node::Block(block) => block.span,
            Node::Expression(expr) => expr.span,
        }
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(program) => write!(f, "{}", program),
            Node::Statement(stmt) => write!(f, "{}", stmt),
            Node::Block(block) => write!(f, "{}", block),
            Node::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl<'a> From<&'a Program> for Node<'a> {
    fn from(program: &'a Program) -> Self {
        Node::Program(program)
    }
}

impl<'a> From<&'a Stmt> for Node<'a> {
    fn from(stmt: &'a Stmt) -> Self {
        Node::Statement(stmt)
    }
}

impl<'a> From<&'a BlockStatement> for Node<'a> {
    fn from(block: &'a BlockStatement) -> Self {
        Node::Block(block)
    }
}

impl<'a> From<&'a Expr> for Node<'a> {
    fn from(expr: &'a Expr) -> Self {
        Node::Expression(expr)
    }
}

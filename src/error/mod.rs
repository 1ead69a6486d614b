//! Error types for instruction encoding and compilation.
//!
//! Runtime failures are not represented here: the evaluator and VM report
//! them as `Object::Error` values.

use crate::span::Span;
use thiserror::Error;

/// Instruction encoding/decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("opcode {0} undefined")]
    UndefinedOpcode(u8),

    #[error("{opcode} expects {expected} operand(s), got {got}")]
    OperandCount {
        opcode: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("operand {operand} of {opcode} does not fit in {width} byte(s)")]
    OperandOverflow {
        opcode: &'static str,
        operand: usize,
        width: usize,
    },

    #[error("{opcode} declares an operand of unsupported width {width}")]
    UnsupportedWidth { opcode: &'static str, width: usize },

    #[error("{opcode} needs {needed} operand byte(s), only {available} available")]
    Truncated {
        opcode: &'static str,
        needed: usize,
        available: usize,
    },
}

impl CodeError {
    pub fn undefined_opcode(byte: u8) -> Self {
        Self::UndefinedOpcode(byte)
    }

    pub fn operand_count(opcode: &'static str, expected: usize, got: usize) -> Self {
        Self::OperandCount {
            opcode,
            expected,
            got,
        }
    }

    pub fn operand_overflow(opcode: &'static str, operand: usize, width: usize) -> Self {
        Self::OperandOverflow {
            opcode,
            operand,
            width,
        }
    }

    pub fn truncated(opcode: &'static str, needed: usize, available: usize) -> Self {
        Self::Truncated {
            opcode,
            needed,
            available,
        }
    }
}

/// Bytecode compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined variable {name} at {span}")]
    UndefinedVariable { name: String, span: Span },

    #[error("cannot encode `{node}` at {span}: {source}")]
    Instruction {
        node: String,
        span: Span,
        source: CodeError,
    },
}

impl CompileError {
    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            span,
        }
    }

    pub fn instruction(node: impl Into<String>, span: Span, source: CodeError) -> Self {
        Self::Instruction {
            node: node.into(),
            span,
            source,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedVariable { span, .. } => *span,
            Self::Instruction { span, .. } => *span,
        }
    }
}

//! Runtime values shared by the compiler, the evaluator and the VM.
//!
//! `Object` is a closed sum type. Compound payloads sit behind `Rc` so a
//! value can be reachable from several containers; no payload is mutable
//! once built.
//!
//! - `hash`: hash keys for Integer, Boolean and String
//! - `environment`: lexical scopes captured by functions
//! - `builtins`: the native function table

pub mod builtins;
pub mod environment;
pub mod hash;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Identifier};
use crate::code::Instructions;

pub use builtins::{lookup_builtin, BUILTINS};
pub use environment::Environment;
pub use hash::{HashKey, HashPair, HashPairs, Hashable};

/// The kind tag every object reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Error,
    Integer,
    Boolean,
    ReturnValue,
    Function,
    String,
    Builtin,
    Array,
    Hash,
    CompiledFunction,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Null => "NULL",
            ObjectType::Error => "ERROR",
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Function => "FUNCTION",
            ObjectType::String => "STRING",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::CompiledFunction => "COMPILED_FUNCTION_OBJ",
        };
        f.write_str(name)
    }
}

/// A runtime value in Monkey.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    /// A runtime failure travelling as an ordinary value.
    Error(String),
    Integer(i64),
    Boolean(bool),
    /// Marks a value produced by `return`; unwrapped by the evaluator.
    ReturnValue(Rc<Object>),
    Function(Rc<Function>),
    String(Rc<str>),
    Builtin(Builtin),
    Array(Rc<Vec<Object>>),
    Hash(Rc<HashPairs>),
    /// Constant-pool form of a function literal.
    CompiledFunction(Rc<CompiledFunction>),
}

/// A user function closed over the scope it was defined in.
pub struct Function {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

// The environment may contain this very function, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Signature of native functions.
pub type BuiltinFunction = fn(&[Object]) -> Object;

/// A native function.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFunction,
}

impl Builtin {
    pub fn call(&self, args: &[Object]) -> Object {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// Bytecode of a function literal, as stored in the constant pool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    /// Local slots the VM must reserve, parameters included.
    pub num_locals: usize,
    pub num_parameters: usize,
}

impl Object {
    pub fn error(message: impl Into<String>) -> Self {
        Object::Error(message.into())
    }

    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Object::String(value.into())
    }

    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(elements))
    }

    pub fn return_value(value: Object) -> Self {
        Object::ReturnValue(Rc::new(value))
    }

    pub fn compiled_function(
        instructions: Instructions,
        num_locals: usize,
        num_parameters: usize,
    ) -> Self {
        Object::CompiledFunction(Rc::new(CompiledFunction {
            instructions,
            num_locals,
            num_parameters,
        }))
    }

    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Null => ObjectType::Null,
            Object::Error(_) => ObjectType::Error,
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Function(_) => ObjectType::Function,
            Object::String(_) => ObjectType::String,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::CompiledFunction(_) => ObjectType::CompiledFunction,
        }
    }

    /// Human-readable rendering, the same text `Display` produces.
    pub fn inspect(&self) -> String {
        self.to_string()
    }

    /// Only `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Boolean(b) => *b,
            Object::Null => false,
            _ => true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Integer(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::String(value.into())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::String(value.into())
    }
}

impl From<Vec<Object>> for Object {
    fn from(elements: Vec<Object>) -> Self {
        Object::array(elements)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::Error(a), Object::Error(b)) => a == b,
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::ReturnValue(a), Object::ReturnValue(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => a == b,
            (Object::Hash(a), Object::Hash(b)) => a == b,
            (Object::CompiledFunction(a), Object::CompiledFunction(b)) => a == b,
            // Functions are equal only to themselves
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Null => write!(f, "null"),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Integer(n) => write!(f, "{}", n),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::ReturnValue(value) => write!(f, "{}", value),
            Object::Function(func) => {
                let params: Vec<&str> = func.parameters.iter().map(|p| p.name.as_str()).collect();
                write!(f, "fn({}) {{\n{}\n}}", params.join(", "), func.body)
            }
            Object::String(s) => f.write_str(s),
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Object::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Object::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expr, ExprKind, Stmt, StmtKind};
    use crate::span::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_inspect() {
        assert_eq!(Object::Integer(5).inspect(), "5");
        assert_eq!(Object::Integer(-12).inspect(), "-12");
        assert_eq!(Object::Boolean(true).inspect(), "true");
        assert_eq!(Object::Boolean(false).inspect(), "false");
        assert_eq!(Object::Null.inspect(), "null");
        assert_eq!(Object::from("hi").inspect(), "hi");
        assert_eq!(Object::error("boom").inspect(), "ERROR: boom");
    }

    #[test]
    fn test_array_inspect() {
        let array = Object::array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(array.inspect(), "[1, 2]");
        assert_eq!(Object::array(vec![]).inspect(), "[]");
    }

    #[test]
    fn test_hash_inspect_keeps_insertion_order() {
        let hash = Object::hash_from_pairs(vec![
            (Object::from("b"), Object::Integer(2)),
            (Object::from("a"), Object::Integer(1)),
        ])
        .expect("string keys are hashable");
        assert_eq!(hash.inspect(), "{b: 2, a: 1}");
    }

    #[test]
    fn test_return_value_renders_inner_value() {
        let wrapped = Object::return_value(Object::Integer(10));
        assert_eq!(wrapped.kind(), ObjectType::ReturnValue);
        assert_eq!(wrapped.inspect(), "10");
    }

    #[test]
    fn test_function_inspect() {
        let body = BlockStatement::new(
            vec![Stmt::new(
                StmtKind::Expression(Expr::new(
                    ExprKind::Infix {
                        left: Box::new(Expr::new(ExprKind::Identifier("x".into()), Span::default())),
                        operator: BinaryOp::Add,
                        right: Box::new(Expr::new(ExprKind::IntegerLiteral(2), Span::default())),
                    },
                    Span::default(),
                )),
                Span::default(),
            )],
            Span::default(),
        );
        let func = Object::Function(Rc::new(Function {
            parameters: vec![
                Identifier::new("x", Span::default()),
                Identifier::new("y", Span::default()),
            ],
            body,
            env: Rc::new(RefCell::new(Environment::new())),
        }));
        assert_eq!(func.kind(), ObjectType::Function);
        assert_eq!(func.inspect(), "fn(x, y) {\n(x + 2)\n}");
    }

    #[test]
    fn test_builtin_inspect() {
        let len = lookup_builtin("len").expect("len is a builtin");
        assert_eq!(Object::Builtin(*len).inspect(), "builtin function");
    }

    #[test]
    fn test_kinds() {
        let cases = vec![
            (Object::Null, ObjectType::Null),
            (Object::error("x"), ObjectType::Error),
            (Object::Integer(1), ObjectType::Integer),
            (Object::Boolean(true), ObjectType::Boolean),
            (Object::from("s"), ObjectType::String),
            (Object::array(vec![]), ObjectType::Array),
            (
                Object::compiled_function(Instructions::new(), 0, 0),
                ObjectType::CompiledFunction,
            ),
        ];
        for (object, kind) in cases {
            assert_eq!(object.kind(), kind);
        }
        assert_eq!(ObjectType::Integer.to_string(), "INTEGER");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Object::Null.is_truthy());
        assert!(!Object::Boolean(false).is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::from("").is_truthy());
    }

    #[test]
    fn test_shared_elements() {
        let shared = Object::from("shared");
        let a = Object::array(vec![shared.clone()]);
        let b = Object::array(vec![Object::Integer(1), shared]);
        match (&a, &b) {
            (Object::Array(a), Object::Array(b)) => match (&a[0], &b[1]) {
                (Object::String(x), Object::String(y)) => assert!(Rc::ptr_eq(x, y)),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_function_equality_is_identity() {
        let make = || {
            Rc::new(Function {
                parameters: vec![],
                body: BlockStatement::default(),
                env: Rc::new(RefCell::new(Environment::new())),
            })
        };
        let f = make();
        assert_eq!(Object::Function(f.clone()), Object::Function(f));
        assert_ne!(Object::Function(make()), Object::Function(make()));
    }
}

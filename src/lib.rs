//! Monkey bytecode core: the instruction set, the runtime object model and the
//! compiler that lowers a Monkey AST to bytecode.
//!
//! Lexing, parsing and execution live elsewhere. A front end parses source
//! into [`ast::Program`], hands it to [`compile`] (or a [`Compiler`] when
//! state must survive between inputs, as in a REPL) and passes the resulting
//! [`Bytecode`] to a virtual machine.

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::new_without_default)]

pub mod ast;
pub mod code;
pub mod compiler;
pub mod error;
pub mod object;
pub mod span;

pub use code::{make, Instructions, Opcode};
pub use compiler::{Bytecode, Compiler};
pub use error::{CodeError, CompileError};
pub use object::{Object, ObjectType};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Route compiler logs to the test writer, at `debug` unless `RUST_LOG`
    /// says otherwise. Safe to call from every test.
    pub fn init_test_logging() {
        use tracing_subscriber::{fmt, EnvFilter};

        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Compile a whole program with a fresh compiler.
pub fn compile(program: &ast::Program) -> Result<Bytecode, CompileError> {
    let mut compiler = Compiler::new();
    compiler.compile(program)?;
    Ok(compiler.into_bytecode())
}

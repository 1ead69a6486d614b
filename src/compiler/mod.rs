//! Bytecode compiler: transforms the AST into instructions plus a constant pool.

pub mod symbol_table;


use tracing::{debug, trace};

use crate::ast::{
    BinaryOp, BlockStatement, Expr, ExprKind, Identifier, Node, Stmt, StmtKind, UnaryOp,
};
use crate::code::{make, Instructions, Opcode};
use crate::error::CompileError;
use crate::object::builtins::BUILTINS;
use crate::object::Object;

pub use symbol_table::{Symbol, SymbolScope, SymbolTable};

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Operand written into a forward jump until its target is known.
const JUMP_PLACEHOLDER: usize = 9999;

/// Output of a compilation: the top-level instructions and every constant
/// they (and the functions among the constants) refer to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Object>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

/// Instructions of one function body (or of the top level) under construction.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

/// A forward jump waiting for its target.
#[must_use]
#[derive(Debug, Clone, Copy)]
struct JumpPatch {
    opcode: Opcode,
    position: usize,
}

/// The bytecode compiler.
///
/// A compiler is single-use per program unless it is explicitly carried over
/// with [`Compiler::into_state`] and [`Compiler::new_with_state`], which is how
/// a REPL keeps globals and constants alive between lines.
#[derive(Debug)]
pub struct Compiler {
    constants: Vec<Object>,
    symbol_table: SymbolTable,
    /// Scope of the function being compiled
    current: CompilationScope,
    /// Scopes of the enclosing functions, innermost last
    enclosing: Vec<CompilationScope>,
}

impl Compiler {
    /// Create a compiler with an empty constant pool and the builtins defined.
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name);
        }
        Self::new_with_state(symbol_table, Vec::new())
    }

    /// Resume from a symbol table and constant pool left by a previous compiler.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Object>) -> Self {
        Self {
            constants,
            symbol_table,
            current: CompilationScope::default(),
            enclosing: Vec::new(),
        }
    }

    /// Compile a node, appending to the instructions and constants so far.
    ///
    /// After an error the partially emitted instructions stay in place; the
    /// bytecode should be discarded.
    pub fn compile<'a>(&mut self, node: impl Into<Node<'a>>) -> CompileResult<()> {
        match node.into() {
            Node::Program(program) => {
                for stmt in &program.statements {
                    self.compile_statement(stmt)?;
                }
            }
            Node::Statement(stmt) => self.compile_statement(stmt)?,
            Node::Block(block) => self.compile_block(block)?,
            Node::Expression(expr) => self.compile_expression(expr)?,
        }

        debug!(
            instructions = self.current.instructions.len(),
            constants = self.constants.len(),
            "compiled node"
        );
        Ok(())
    }

    /// Snapshot of the top-level instructions and the constant pool.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current.instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    pub fn into_bytecode(self) -> Bytecode {
        Bytecode {
            instructions: self.current.instructions,
            constants: self.constants,
        }
    }

    /// Give up the symbol table and constants for the next REPL line.
    pub fn into_state(self) -> (SymbolTable, Vec<Object>) {
        (self.symbol_table, self.constants)
    }

    // ===== Statements =====

    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        let node = Node::Statement(stmt);

        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(Opcode::Pop, &[], node)?;
            }

            StmtKind::Let { name, value } => {
                // The value sees the previous binding of the name, if any.
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(&name.name);
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index], node)?,
                    _ => self.emit(Opcode::SetLocal, &[symbol.index], node)?,
                };
            }

            StmtKind::Return(value) => {
                self.compile_expression(value)?;
                self.emit(Opcode::ReturnValue, &[], node)?;
            }
        }

        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> CompileResult<()> {
        for stmt in &block.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    // ===== Expressions =====

    fn compile_expression(&mut self, expr: &Expr) -> CompileResult<()> {
        let node = Node::Expression(expr);

        match &expr.kind {
            ExprKind::IntegerLiteral(value) => {
                let index = self.add_constant(Object::Integer(*value));
                self.emit(Opcode::Constant, &[index], node)?;
            }

            ExprKind::StringLiteral(value) => {
                let index = self.add_constant(Object::from(value.as_str()));
                self.emit(Opcode::Constant, &[index], node)?;
            }

            ExprKind::Boolean(true) => {
                self.emit(Opcode::True, &[], node)?;
            }
            ExprKind::Boolean(false) => {
                self.emit(Opcode::False, &[], node)?;
            }

            ExprKind::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::undefined_variable(name.as_str(), expr.span))?;
                self.load_symbol(&symbol, node)?;
            }

            ExprKind::Prefix { operator, right } => {
                self.compile_expression(right)?;
                let op = match operator {
                    UnaryOp::Negate => Opcode::Minus,
                    UnaryOp::Not => Opcode::Bang,
                };
                self.emit(op, &[], node)?;
            }

            ExprKind::Infix {
                left,
                operator,
                right,
            } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                let op = match operator {
                    BinaryOp::Add => Opcode::Add,
                    BinaryOp::Subtract => Opcode::Sub,
                    BinaryOp::Multiply => Opcode::Mul,
                    BinaryOp::Divide => Opcode::Div,
                    BinaryOp::Equal => Opcode::Equal,
                    BinaryOp::NotEqual => Opcode::NotEqual,
                    BinaryOp::Greater => Opcode::GreaterThan,
                    BinaryOp::Less => Opcode::LessThan,
                };
                self.emit(op, &[], node)?;
            }

            ExprKind::If {
                condition,
                consequence,
                alternative,
            } => {
                self.compile_expression(condition)?;
                let jump_not_truthy = self.emit_jump(Opcode::JumpNotTruthy, node)?;

                self.compile_branch(consequence, node)?;
                let jump = self.emit_jump(Opcode::Jump, node)?;
                self.patch_jump(jump_not_truthy, node)?;

                match alternative {
                    Some(alternative) => self.compile_branch(alternative, node)?,
                    None => {
                        self.emit(Opcode::Null, &[], node)?;
                    }
                }
                self.patch_jump(jump, node)?;
            }

            ExprKind::Function {
                parameters,
                body,
                name,
            } => {
                self.compile_function(parameters, body, name.as_deref(), node)?;
            }

            ExprKind::Call {
                function,
                arguments,
            } => {
                self.compile_expression(function)?;
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[arguments.len()], node)?;
            }

            ExprKind::Array(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[elements.len()], node)?;
            }

            ExprKind::Hash(pairs) => {
                // Source order, so side effects in keys and values run as written.
                for (key, value) in pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[pairs.len() * 2], node)?;
            }

            ExprKind::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Opcode::Index, &[], node)?;
            }
        }

        Ok(())
    }

    /// Compile one arm of a conditional so that it leaves exactly one value.
    fn compile_branch(&mut self, block: &BlockStatement, node: Node<'_>) -> CompileResult<()> {
        self.compile_block(block)?;
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_pop();
        } else {
            // Empty arm, or one ending in a `let`/`return`.
            self.emit(Opcode::Null, &[], node)?;
        }
        Ok(())
    }

    fn compile_function(
        &mut self,
        parameters: &[Identifier],
        body: &BlockStatement,
        name: Option<&str>,
        node: Node<'_>,
    ) -> CompileResult<()> {
        self.enter_scope();

        if let Some(name) = name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in parameters {
            self.symbol_table.define(&parameter.name);
        }

        // Leave the scope even on failure so the compiler stays balanced.
        let compiled = self.compile_function_body(body, node);
        let (scope, symbol_table) = self.leave_scope();
        compiled?;

        let free_symbols = symbol_table.free_symbols();
        for symbol in free_symbols {
            self.load_symbol(symbol, node)?;
        }

        let function = Object::compiled_function(
            scope.instructions,
            symbol_table.num_definitions(),
            parameters.len(),
        );
        let index = self.add_constant(function);
        self.emit(Opcode::Closure, &[index, free_symbols.len()], node)?;
        Ok(())
    }

    fn compile_function_body(
        &mut self,
        body: &BlockStatement,
        node: Node<'_>,
    ) -> CompileResult<()> {
        self.compile_block(body)?;

        // The value of a trailing expression statement is the implicit result.
        if self.last_instruction_is(Opcode::Pop) {
            self.replace_last_pop_with_return(node)?;
        }
        if !self.last_instruction_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[], node)?;
        }
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol, node: Node<'_>) -> CompileResult<()> {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index], node)?,
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index], node)?,
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index], node)?,
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index], node)?,
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[], node)?,
        };
        Ok(())
    }

    // ===== Scopes =====

    fn enter_scope(&mut self) {
        let outer_scope = std::mem::take(&mut self.current);
        self.enclosing.push(outer_scope);

        let outer_table = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer_table);

        debug!(depth = self.enclosing.len(), "entered function scope");
    }

    /// Pop the innermost scope, returning its instructions and symbol table.
    fn leave_scope(&mut self) -> (CompilationScope, SymbolTable) {
        let outer_scope = self.enclosing.pop().unwrap_or_default();
        let scope = std::mem::replace(&mut self.current, outer_scope);

        let mut symbol_table = std::mem::take(&mut self.symbol_table);
        self.symbol_table = symbol_table.take_outer().unwrap_or_default();

        debug!(
            depth = self.enclosing.len(),
            instructions = scope.instructions.len(),
            locals = symbol_table.num_definitions(),
            free = symbol_table.free_symbols().len(),
            "left function scope"
        );
        (scope, symbol_table)
    }

    // ===== Bytecode emission =====

    fn emit(&mut self, op: Opcode, operands: &[usize], node: Node<'_>) -> CompileResult<usize> {
        let instruction = make(op, operands)
            .map_err(|err| CompileError::instruction(node.to_string(), node.span(), err))?;
        let position = self.current.instructions.append(&instruction);
        trace!(position, opcode = op.name(), ?operands, "emit");

        self.set_last_instruction(op, position);
        Ok(position)
    }

    fn emit_jump(&mut self, op: Opcode, node: Node<'_>) -> CompileResult<JumpPatch> {
        let position = self.emit(op, &[JUMP_PLACEHOLDER], node)?;
        Ok(JumpPatch {
            opcode: op,
            position,
        })
    }

    /// Point a pending jump at the next instruction to be emitted.
    fn patch_jump(&mut self, patch: JumpPatch, node: Node<'_>) -> CompileResult<()> {
        let target = self.current.instructions.len();
        let instruction = make(patch.opcode, &[target])
            .map_err(|err| CompileError::instruction(node.to_string(), node.span(), err))?;
        self.current
            .instructions
            .overwrite(patch.position, &instruction);
        Ok(())
    }

    fn set_last_instruction(&mut self, opcode: Opcode, position: usize) {
        self.current.previous_instruction = self.current.last_instruction;
        self.current.last_instruction = Some(EmittedInstruction { opcode, position });
    }

    fn last_instruction_is(&self, opcode: Opcode) -> bool {
        matches!(self.current.last_instruction, Some(last) if last.opcode == opcode)
    }

    fn remove_last_pop(&mut self) {
        if let Some(last) = self.current.last_instruction {
            self.current.instructions.truncate(last.position);
            self.current.last_instruction = self.current.previous_instruction;
        }
    }

    fn replace_last_pop_with_return(&mut self, node: Node<'_>) -> CompileResult<()> {
        if let Some(last) = self.current.last_instruction {
            let instruction = make(Opcode::ReturnValue, &[])
                .map_err(|err| CompileError::instruction(node.to_string(), node.span(), err))?;
            self.current.instructions.overwrite(last.position, &instruction);
            self.current.last_instruction = Some(EmittedInstruction {
                opcode: Opcode::ReturnValue,
                position: last.position,
            });
        }
        Ok(())
    }

    fn add_constant(&mut self, constant: Object) -> usize {
        self.constants.push(constant);
        self.constants.len() - 1
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

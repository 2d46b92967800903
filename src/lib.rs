//! Compiler from single Jack classes to stack-machine VM text.
//!
//! Tokens are pulled one at a time from the source, declarations feed a
//! two-tier symbol table, and every expression is parsed into a small tree
//! that is lowered to `push`/`pop`/`call` instructions straight away.

pub mod ast;
pub mod code_gen;
pub mod common;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

pub use crate::common::{CompileError, CompileResult, LexError, LexErrorKind};
pub use crate::compiler::{compile, compile_to, CompilationEngine};

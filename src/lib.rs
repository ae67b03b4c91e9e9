//! Crate root: wires together the compilation pipeline.
//!
//! The front end is single pass. The parser pulls tokens from the scanner on
//! demand and writes instructions straight into the store, so there is no
//! intermediate tree:
//! - `tokenizer` classifies source text into tokens, one at a time.
//! - `symtab` is the flat table of declared constants and variables.
//! - `code` holds the emitted three-address instructions and temporaries.
//! - `backpatch` tracks jumps whose targets are not known yet.
//! - `parser` drives all of the above, one method per grammar rule.
//! - `listing` renders the result for display.
//! - `error` carries recoverable diagnostics and fatal errors.

pub mod backpatch;
pub mod code;
pub mod error;
pub mod listing;
pub mod options;
pub mod parser;
pub mod symtab;
pub mod tokenizer;

pub use error::{CompileError, CompileResult, Diagnostic, DiagnosticKind};
pub use options::Options;

use code::InstructionStore;
use symtab::SymbolTable;

/// Everything one compilation produced.
#[derive(Debug)]
pub struct Compilation {
  /// Name after `PROGRAM`, if present.
  pub program: Option<String>,
  pub symbols: SymbolTable,
  pub code: InstructionStore,
  pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
  /// True when the source produced no diagnostics.
  pub fn is_clean(&self) -> bool {
    self.diagnostics.is_empty()
  }

  /// Ordered `(address, text)` pairs.
  pub fn listing(&self) -> Vec<(usize, String)> {
    self.code.listing()
  }
}

/// Compile a source string into a three-address listing.
///
/// Problems in the program come back as `Compilation::diagnostics`; only a
/// broken jump chain is an `Err`.
pub fn compile(source: &str, options: &Options) -> CompileResult<Compilation> {
  parser::parse(source, options)
}

//! Text output: the instruction listing and the symbol dump.

use std::fmt::Write;

use crate::Compilation;
use crate::symtab::SymbolTable;

/// One instruction per line, in address order.
pub fn render(compilation: &Compilation) -> String {
  let mut out = String::new();
  for (_, line) in compilation.listing() {
    out.push_str(&line);
    out.push('\n');
  }
  out
}

/// One `name: <name>, kind: <kind>` line per symbol, in declaration order.
pub fn render_symbols(symbols: &SymbolTable) -> String {
  let mut out = String::new();
  for entry in symbols.iter() {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "name: {}, kind: {}", entry.name, entry.kind);
  }
  out
}

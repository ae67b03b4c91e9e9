//! Flat name table. The language has a single scope, so entries are never
//! removed once declared.

use std::fmt;

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
  Constant,
  Variable,
}

impl fmt::Display for SymbolKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Constant => "constant",
      Self::Variable => "variable",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
  pub name: String,
  pub kind: SymbolKind,
  pub line: usize,
}

/// Declared names in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
  entries: IndexMap<String, SymbolEntry>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert `name`, or return `false` if it is already taken. An existing
  /// entry is never overwritten.
  pub fn declare(&mut self, name: &str, kind: SymbolKind, line: usize) -> bool {
    if self.entries.contains_key(name) {
      log::trace!("'{name}' already declared");
      return false;
    }
    log::trace!("declaring {kind} '{name}'");
    self.entries.insert(
      name.to_string(),
      SymbolEntry {
        name: name.to_string(),
        kind,
        line,
      },
    );
    true
  }

  pub fn lookup(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
    self.entries.get(name).map(|entry| entry.kind)
  }

  pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
    self.entries.values()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

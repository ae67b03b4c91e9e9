//! Shared error utilities used across the compilation pipeline.
//!
//! Problems come in two tiers. A `Diagnostic` describes something wrong with
//! the program being compiled; it is recorded with its source line and parsing
//! carries on. A `CompileError` stops compilation. Most variants mean the
//! generator lost track of its jump bookkeeping; the rest cover an exhausted
//! address range and unreadable input.

use std::fmt;
use std::path::PathBuf;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Fatal failures. Everything except `AddressOverflow` and `Io` indicates a
/// bug in the generator.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display(
    "internal error: cannot patch address {address}, emitted range is {first}..{end}"
  ))]
  PatchOutOfRange {
    address: usize,
    first: usize,
    end: usize,
  },

  #[snafu(display("internal error: instruction at {address} is not a jump"))]
  NotAJump { address: usize },

  #[snafu(display(
    "internal error: jump at {address} already targets {existing}, cannot retarget to {target}"
  ))]
  AlreadyPatched {
    address: usize,
    existing: usize,
    target: usize,
  },

  #[snafu(display("internal error: jumps left without a target at {addresses:?}"))]
  DanglingJumps { addresses: Vec<usize> },

  #[snafu(display("no address left after {first} for another instruction"))]
  AddressOverflow { first: usize },

  #[snafu(display("could not read {}: {source}", path.display()))]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// Recoverable problems in the source program.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DiagnosticKind {
  #[snafu(display("expected {expected}, found {found}"))]
  Expected { expected: String, found: String },

  #[snafu(display("'{name}' is already declared"))]
  DuplicateDeclaration { name: String },

  #[snafu(display("'{name}' is not declared"))]
  Undeclared { name: String },

  #[snafu(display("cannot assign to constant '{name}'"))]
  AssignToConstant { name: String },

  #[snafu(display("number {digits} has more than {max} digits"))]
  NumberTooLong { digits: String, max: usize },

  #[snafu(display("nesting deeper than {max} levels"))]
  NestingTooDeep { max: usize },

  #[snafu(display("unexpected {found} after the end of the program"))]
  TrailingInput { found: String },
}

/// A problem anchored at a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub line: usize,
  pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "line {}: {}", self.line, self.kind)
  }
}

/// Append-only sink shared by the scanner and the parser.
#[derive(Debug, Default)]
pub struct Diagnostics {
  items: Vec<Diagnostic>,
}

impl Diagnostics {
  pub fn report(&mut self, line: usize, kind: DiagnosticKind) {
    let diagnostic = Diagnostic { line, kind };
    log::warn!("{diagnostic}");
    self.items.push(diagnostic);
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  #[cfg(test)]
  pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
    self.items.iter()
  }

  pub fn into_vec(self) -> Vec<Diagnostic> {
    self.items
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn diagnostic_display_carries_line() {
    let diagnostic = Diagnostic {
      line: 7,
      kind: UndeclaredSnafu { name: "y" }.build(),
    };
    assert_eq!(diagnostic.to_string(), "line 7: 'y' is not declared");
  }

  #[test]
  fn sink_keeps_report_order() {
    let mut sink = Diagnostics::default();
    sink.report(2, DuplicateDeclarationSnafu { name: "a" }.build());
    sink.report(1, NestingTooDeepSnafu { max: 4usize }.build());

    let lines: Vec<usize> = sink.iter().map(|d| d.line).collect();
    assert_eq!(lines, vec![2, 1]);
    assert_eq!(sink.len(), 2);
    assert!(!sink.is_empty());
  }

  #[test]
  fn internal_errors_name_the_address() {
    let err = AlreadyPatchedSnafu {
      address: 3usize,
      existing: 5usize,
      target: 9usize,
    }
    .build();
    assert!(err.to_string().contains("jump at 3 already targets 5"));
  }
}

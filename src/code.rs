//! Three-address instructions and the address-indexed store they are emitted
//! into.
//!
//! Addresses are handed out in emission order starting at the configured
//! first address, with no gaps. After emission an instruction only changes
//! when a jump receives its target, and that happens exactly once. The
//! address one past the last instruction always fits in a `usize`, so
//! `emit` refuses an instruction once that would stop being true.

use std::fmt;

use snafu::{OptionExt, ensure};

use crate::error::{
  AddressOverflowSnafu, AlreadyPatchedSnafu, CompileResult, NotAJumpSnafu, PatchOutOfRangeSnafu,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl fmt::Display for ArithOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
}

impl fmt::Display for RelOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Eq => "=",
      Self::Ne => "<>",
      Self::Lt => "<",
      Self::Le => "<=",
      Self::Gt => ">",
      Self::Ge => ">=",
    })
  }
}

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rvalue {
  Copy(String),
  Neg(String),
  Binary {
    op: ArithOp,
    lhs: String,
    rhs: String,
  },
}

impl fmt::Display for Rvalue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Copy(operand) => f.write_str(operand),
      Self::Neg(operand) => write!(f, "-{operand}"),
      Self::Binary { op, lhs, rhs } => write!(f, "{lhs}{op}{rhs}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
  Assign {
    dest: String,
    value: Rvalue,
  },
  CondJump {
    lhs: String,
    op: RelOp,
    rhs: String,
    target: Option<usize>,
  },
  Jump {
    target: Option<usize>,
  },
}

impl Instruction {
  pub fn is_jump(&self) -> bool {
    !matches!(self, Self::Assign { .. })
  }

  /// Resolved target of a jump; `None` for assignments and pending jumps.
  pub fn target(&self) -> Option<usize> {
    match self {
      Self::Assign { .. } => None,
      Self::CondJump { target, .. } | Self::Jump { target } => *target,
    }
  }

  fn target_slot(&mut self) -> Option<&mut Option<usize>> {
    match self {
      Self::Assign { .. } => None,
      Self::CondJump { target, .. } | Self::Jump { target } => Some(target),
    }
  }

  /// Listing line for this instruction at `address`. Pending targets are
  /// left blank.
  pub fn render(&self, address: usize) -> String {
    match self {
      Self::Assign { dest, value } => format!("{address}:\t{dest}:={value}"),
      Self::CondJump {
        lhs,
        op,
        rhs,
        target,
      } => format!(
        "{address}:    if {lhs} {op} {rhs} goto {}",
        Target(*target)
      ),
      Self::Jump { target } => format!("{address}:    goto {}", Target(*target)),
    }
  }
}

struct Target(Option<usize>);

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Some(address) => write!(f, "{address}"),
      None => Ok(()),
    }
  }
}

/// Append-only instruction sequence with in-place jump patching.
#[derive(Debug)]
pub struct InstructionStore {
  first: usize,
  code: Vec<Instruction>,
}

impl InstructionStore {
  pub fn new(first: usize) -> Self {
    Self {
      first,
      code: Vec::new(),
    }
  }

  /// Address the next `emit` will assign.
  pub fn next_address(&self) -> usize {
    self.first + self.code.len()
  }

  pub fn emit(&mut self, instruction: Instruction) -> CompileResult<usize> {
    let address = self.next_address();
    ensure!(
      address < usize::MAX,
      AddressOverflowSnafu { first: self.first }
    );
    log::debug!("emit {}", instruction.render(address));
    self.code.push(instruction);
    Ok(address)
  }

  /// Write `target` into the pending jump at `address`.
  pub fn patch(&mut self, address: usize, target: usize) -> CompileResult<()> {
    let first = self.first;
    let end = self.next_address();
    let index = address
      .checked_sub(first)
      .filter(|index| *index < self.code.len())
      .context(PatchOutOfRangeSnafu {
        address,
        first,
        end,
      })?;

    let slot = self.code[index]
      .target_slot()
      .context(NotAJumpSnafu { address })?;
    if let Some(existing) = *slot {
      return AlreadyPatchedSnafu {
        address,
        existing,
        target,
      }
      .fail();
    }
    *slot = Some(target);
    Ok(())
  }

  pub fn get(&self, address: usize) -> Option<&Instruction> {
    address
      .checked_sub(self.first)
      .and_then(|index| self.code.get(index))
  }

  pub fn iter(&self) -> impl Iterator<Item = (usize, &Instruction)> {
    let first = self.first;
    self
      .code
      .iter()
      .enumerate()
      .map(move |(index, instruction)| (first + index, instruction))
  }

  /// Addresses of jumps that still have no target.
  pub fn unresolved(&self) -> Vec<usize> {
    self
      .iter()
      .filter(|(_, instruction)| instruction.is_jump() && instruction.target().is_none())
      .map(|(address, _)| address)
      .collect()
  }

  pub fn listing(&self) -> Vec<(usize, String)> {
    self
      .iter()
      .map(|(address, instruction)| (address, instruction.render(address)))
      .collect()
  }

  pub fn first_address(&self) -> usize {
    self.first
  }

  pub fn len(&self) -> usize {
    self.code.len()
  }

  pub fn is_empty(&self) -> bool {
    self.code.is_empty()
  }
}

/// Mints `t0`, `t1`, ... for intermediate results.
#[derive(Debug)]
pub struct TempNames {
  next: usize,
}

impl TempNames {
  pub fn new(first: usize) -> Self {
    Self { next: first }
  }

  pub fn fresh(&mut self) -> String {
    let name = format!("t{}", self.next);
    self.next += 1;
    name
  }
}

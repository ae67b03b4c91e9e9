//! Lists of jump addresses waiting for a target.
//!
//! A list is owned by whichever grammar procedure currently holds it.
//! Resolving it with `backpatch` consumes the value, so a list cannot be
//! patched twice or read after its jumps have been filled in.

use crate::code::InstructionStore;
use crate::error::CompileResult;

#[must_use = "pending jumps must be backpatched or handed to the caller"]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackpatchList {
  addresses: Vec<usize>,
}

impl BackpatchList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(address: usize) -> Self {
    Self {
      addresses: vec![address],
    }
  }

  /// `self` followed by `other`.
  pub fn merge(mut self, mut other: BackpatchList) -> Self {
    self.addresses.append(&mut other.addresses);
    self
  }

  #[cfg(test)]
  pub fn addresses(&self) -> &[usize] {
    &self.addresses
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.addresses.is_empty()
  }

  /// Point every pending jump at `target`.
  pub fn backpatch(self, code: &mut InstructionStore, target: usize) -> CompileResult<()> {
    if !self.addresses.is_empty() {
      log::debug!("backpatch {:?} -> {target}", self.addresses);
    }
    for address in self.addresses {
      code.patch(address, target)?;
    }
    Ok(())
  }
}

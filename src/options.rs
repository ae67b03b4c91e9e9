//! Knobs for a single compilation.

/// Longest integer literal accepted without a diagnostic.
pub const DEFAULT_MAX_DIGITS: usize = 14;

/// Statement/expression nesting allowed before the parser gives up on a
/// construct.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
  /// Address given to the first emitted instruction.
  pub first_address: usize,
  /// Index of the first temporary (`t0` by default).
  pub first_temp: usize,
  pub max_digits: usize,
  pub max_depth: usize,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      first_address: 0,
      first_temp: 0,
      max_digits: DEFAULT_MAX_DIGITS,
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}

impl Options {
  pub fn with_first_address(mut self, address: usize) -> Self {
    self.first_address = address;
    self
  }

  pub fn with_first_temp(mut self, index: usize) -> Self {
    self.first_temp = index;
    self
  }

  pub fn with_max_digits(mut self, digits: usize) -> Self {
    self.max_digits = digits;
    self
  }

  pub fn with_max_depth(mut self, depth: usize) -> Self {
    self.max_depth = depth;
    self
  }
}

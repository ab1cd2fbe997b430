//! ILP variable types.

use std::fmt;

/// Index of a decision variable inside an [`IlpModel`](super::IlpModel).
///
/// Variables are addressed by position, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    /// Position of the variable in the model.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A binary (0/1) decision variable.
///
/// Can be fixed to a single value, which is how the modeling layer
/// expresses `x = 0` / `x = 1` without a separate constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinVar {
    /// Fixed value, if any.
    pub fixed: Option<bool>,
}

impl BinVar {
    /// Creates a free binary variable.
    pub fn new() -> Self {
        Self { fixed: None }
    }

    /// Creates a binary variable fixed to `value`.
    pub fn fixed(value: bool) -> Self {
        Self { fixed: Some(value) }
    }
}

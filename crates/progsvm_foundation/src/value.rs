//! The value cell every program datum is stored in.
//!
//! A [`Cell`] is four raw bytes. The opcode that touches it decides whether
//! those bytes are a float, an integer, a string id, a function id, or an
//! entity index. Nothing is stored alongside the bits to say which.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityIndex;
use crate::intern::StringId;

/// Three contiguous float cells.
pub type Vec3 = [f32; 3];

/// An untyped 4-byte slot, reinterpreted by the instruction that reads it.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Cell(u32);

impl Cell {
    /// The all-zero cell: `0.0`, `0`, the empty string, the world, the null function.
    pub const ZERO: Cell = Cell(0);

    /// Creates a cell from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Creates a cell holding a float.
    #[must_use]
    pub fn from_float(value: f32) -> Self {
        Self(value.to_bits())
    }

    /// Reads the cell as a float.
    #[must_use]
    pub fn as_float(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Creates a cell holding a signed integer.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn from_int(value: i32) -> Self {
        Self(value as u32)
    }

    /// Reads the cell as a signed integer.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn as_int(self) -> i32 {
        self.0 as i32
    }

    /// Creates a cell holding a string id.
    #[must_use]
    pub const fn from_string(id: StringId) -> Self {
        Self(id.offset())
    }

    /// Reads the cell as a string id.
    #[must_use]
    pub const fn as_string(self) -> StringId {
        StringId::new(self.0)
    }

    /// Creates a cell holding a function id.
    #[must_use]
    pub const fn from_function(id: FunctionId) -> Self {
        Self(id.0)
    }

    /// Reads the cell as a function id.
    #[must_use]
    pub const fn as_function(self) -> FunctionId {
        FunctionId(self.0)
    }

    /// Creates a cell holding an entity index.
    #[must_use]
    pub const fn from_entity(entity: EntityIndex) -> Self {
        Self(entity.get())
    }

    /// Reads the cell as an entity index.
    #[must_use]
    pub const fn as_entity(self) -> EntityIndex {
        EntityIndex::new(self.0)
    }

    /// Returns true if every bit is zero.
    ///
    /// This is the truth test `IF` and `IFNOT` apply, so `-0.0` is true.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cell({:#010x})", self.0)
    }
}

impl From<f32> for Cell {
    fn from(value: f32) -> Self {
        Self::from_float(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

/// Index into a program's function table.
///
/// Function 0 is the null function; calling it is a fatal error.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionId(pub u32);

impl FunctionId {
    /// The null function.
    pub const NULL: FunctionId = FunctionId(0);

    /// Returns true for the null function.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionId({})", self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function #{}", self.0)
    }
}

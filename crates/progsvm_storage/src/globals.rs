//! The global segment.
//!
//! One flat array of cells holds every global variable, every function's
//! parameters and locals, and the fixed return and parameter slots. Offsets
//! are trusted: the program image is validated once at load, so accessors
//! index directly and panic on an offset that validation would have
//! rejected.

use std::ops::Range;

use progsvm_foundation::{Cell, EntityIndex, FunctionId, StringId, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Flat array of value cells shared by all functions.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlobalSegment {
    cells: Vec<Cell>,
}

impl GlobalSegment {
    /// Creates a zeroed segment of `len` cells.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![Cell::ZERO; len],
        }
    }

    /// Creates a segment from initial cell contents.
    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Returns the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the segment has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at `ofs`.
    ///
    /// # Panics
    ///
    /// Panics if `ofs` is out of range.
    #[must_use]
    pub fn get(&self, ofs: usize) -> Cell {
        self.cells[ofs]
    }

    /// Returns the cell at `ofs`, or `None` if out of range.
    #[must_use]
    pub fn try_get(&self, ofs: usize) -> Option<Cell> {
        self.cells.get(ofs).copied()
    }

    /// Writes the cell at `ofs`.
    ///
    /// # Panics
    ///
    /// Panics if `ofs` is out of range.
    pub fn set(&mut self, ofs: usize, cell: Cell) {
        self.cells[ofs] = cell;
    }

    /// Reads a float.
    #[must_use]
    pub fn float(&self, ofs: usize) -> f32 {
        self.cells[ofs].as_float()
    }

    /// Writes a float.
    pub fn set_float(&mut self, ofs: usize, value: f32) {
        self.cells[ofs] = Cell::from_float(value);
    }

    /// Reads an integer.
    #[must_use]
    pub fn int(&self, ofs: usize) -> i32 {
        self.cells[ofs].as_int()
    }

    /// Writes an integer.
    pub fn set_int(&mut self, ofs: usize, value: i32) {
        self.cells[ofs] = Cell::from_int(value);
    }

    /// Reads three consecutive cells as a vector.
    #[must_use]
    pub fn vector(&self, ofs: usize) -> Vec3 {
        [
            self.cells[ofs].as_float(),
            self.cells[ofs + 1].as_float(),
            self.cells[ofs + 2].as_float(),
        ]
    }

    /// Writes a vector into three consecutive cells.
    pub fn set_vector(&mut self, ofs: usize, value: Vec3) {
        for (i, v) in value.into_iter().enumerate() {
            self.cells[ofs + i] = Cell::from_float(v);
        }
    }

    /// Reads a string id.
    #[must_use]
    pub fn string(&self, ofs: usize) -> StringId {
        self.cells[ofs].as_string()
    }

    /// Reads an entity index.
    #[must_use]
    pub fn entity(&self, ofs: usize) -> EntityIndex {
        self.cells[ofs].as_entity()
    }

    /// Writes an entity index.
    pub fn set_entity(&mut self, ofs: usize, entity: EntityIndex) {
        self.cells[ofs] = Cell::from_entity(entity);
    }

    /// Reads a function id.
    #[must_use]
    pub fn function(&self, ofs: usize) -> FunctionId {
        self.cells[ofs].as_function()
    }

    /// Copies `len` cells from `src` to `dst`. The ranges may overlap.
    pub fn copy(&mut self, src: usize, dst: usize, len: usize) {
        self.cells.copy_within(src..src + len, dst);
    }

    /// Returns a range of cells.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> &[Cell] {
        &self.cells[range]
    }

    /// Returns a mutable range of cells.
    pub fn slice_mut(&mut self, range: Range<usize>) -> &mut [Cell] {
        &mut self.cells[range]
    }

    /// Overwrites cells starting at `start`.
    pub fn write_slice(&mut self, start: usize, cells: &[Cell]) {
        self.cells[start..start + cells.len()].copy_from_slice(cells);
    }

    /// Returns every cell.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

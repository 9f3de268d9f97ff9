//! The entity table.
//!
//! A fixed-capacity arena of entity records. Every record has the same
//! number of cells, laid out by the program's field definitions, plus a
//! little engine bookkeeping kept beside the cells: whether the record is
//! free, when it was freed, and whether the spatial index links it.
//!
//! Records below `reserved` are never handed out or freed. Record 0 is the
//! world.

// Allow usize to u32 casts - record indices are bounded by the 16-bit fat address
#![allow(clippy::cast_possible_truncation)]

use progsvm_foundation::{
    Cell, EntityIndex, Error, ErrorKind, FieldAddress, Result, Vec3, VmLimit,
};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::EntityConfig;
use crate::layout::FieldLayout;
use crate::spatial::SpatialIndex;

/// Engine-reserved bookkeeping for one record.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdictState {
    /// The record is not in use.
    pub free: bool,
    /// Time at which the record was last freed.
    pub free_time: f32,
    /// The spatial index holds links for this record.
    pub linked: bool,
}

/// Fixed-capacity arena of entity records.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityTable {
    /// Record shape.
    layout: FieldLayout,
    /// Sizing and reuse policy.
    config: EntityConfig,
    /// `capacity * field_count` cells, record-major.
    cells: Vec<Cell>,
    /// Bookkeeping for records `0..num_edicts`.
    states: Vec<EdictState>,
}

impl EntityTable {
    /// Creates a table whose reserved records exist and are in use.
    ///
    /// Capacity is clamped to what a [`FieldAddress`] can reach, and to at
    /// least the reserved prefix.
    #[must_use]
    pub fn new(layout: FieldLayout, config: EntityConfig) -> Self {
        let max = FieldAddress::MAX_ENTITY as usize + 1;
        let mut config = config;
        config.reserved = config.reserved.clamp(1, max);
        config.capacity = config.capacity.clamp(config.reserved, max);

        Self {
            cells: vec![Cell::ZERO; config.capacity * layout.field_count],
            states: vec![EdictState::default(); config.reserved],
            layout,
            config,
        }
    }

    /// Returns the record layout.
    #[must_use]
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    /// Maximum number of records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of records ever brought into use (the high-water mark).
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no records exist. The world always exists, so never true.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of records currently in use, world included.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.states.iter().filter(|s| !s.free).count()
    }

    /// Returns the bookkeeping for a record.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` if the record does not exist.
    pub fn state(&self, entity: EntityIndex) -> Result<&EdictState> {
        self.states
            .get(entity.index())
            .ok_or_else(|| Error::new(ErrorKind::BadEntity(entity.get())))
    }

    /// Returns true if the record exists and is free.
    #[must_use]
    pub fn is_free(&self, entity: EntityIndex) -> bool {
        self.states.get(entity.index()).is_some_and(|s| s.free)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Allocates a record, clearing its fields.
    ///
    /// Scans upward from the first non-reserved record for a free record that
    /// has been free for at least the hysteresis window. Failing that the
    /// table grows by one. A full table falls back to the record that has
    /// been free the longest.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded(Edicts)` if the table is full with no free record.
    pub fn allocate(&mut self, now: f32) -> Result<EntityIndex> {
        let reserved = self.config.reserved;
        let reusable = self.states[reserved.min(self.states.len())..]
            .iter()
            .position(|s| s.free && self.reusable(s, now))
            .map(|i| i + reserved);

        let index = if let Some(index) = reusable {
            index
        } else if self.states.len() < self.config.capacity {
            self.states.push(EdictState::default());
            self.states.len() - 1
        } else if let Some(index) = self.longest_free(reserved) {
            index
        } else {
            return Err(Error::limit_exceeded(VmLimit::Edicts {
                limit: self.config.capacity,
            }));
        };

        let entity = EntityIndex::new(index as u32);
        self.clear(entity);
        debug!(entity = index, time = now, "allocated edict");
        Ok(entity)
    }

    /// The free record with the oldest free time, lowest index on ties.
    fn longest_free(&self, reserved: usize) -> Option<usize> {
        self.states
            .iter()
            .enumerate()
            .skip(reserved)
            .filter(|(_, s)| s.free)
            .min_by(|(_, a), (_, b)| a.free_time.total_cmp(&b.free_time))
            .map(|(i, _)| i)
    }

    fn reusable(&self, state: &EdictState, now: f32) -> bool {
        state.free_time < self.config.startup_grace
            || now - state.free_time >= self.config.free_hysteresis
    }

    /// Frees a record.
    ///
    /// Unlinks it from the spatial index, marks it free, clears the fields the
    /// simulation reads (model, solidity, think schedule, position), and stamps
    /// the free time used by the reuse hysteresis.
    ///
    /// # Errors
    ///
    /// Returns `ReservedEntity` for reserved records and `BadEntity` for
    /// records that do not exist.
    pub fn free(
        &mut self,
        entity: EntityIndex,
        now: f32,
        spatial: &mut dyn SpatialIndex,
    ) -> Result<()> {
        if entity.index() < self.config.reserved {
            return Err(Error::new(ErrorKind::ReservedEntity(entity)));
        }
        if entity.index() >= self.states.len() {
            return Err(Error::new(ErrorKind::BadEntity(entity.get())));
        }

        spatial.unlink(entity);

        let system = self.layout.system;
        let base = self.base(entity);
        for field in system.cleared_scalars() {
            self.cells[base + field as usize] = Cell::ZERO;
        }
        for field in system.cleared_vectors() {
            let start = base + field as usize;
            self.cells[start..start + 3].fill(Cell::ZERO);
        }
        if let Some(nextthink) = system.nextthink {
            self.cells[base + nextthink as usize] = Cell::from_float(-1.0);
        }

        let state = &mut self.states[entity.index()];
        state.free = true;
        state.linked = false;
        state.free_time = now;
        debug!(entity = entity.get(), time = now, "freed edict");
        Ok(())
    }

    /// Zeroes a record's fields and marks it in use.
    fn clear(&mut self, entity: EntityIndex) {
        let base = self.base(entity);
        self.cells[base..base + self.layout.field_count].fill(Cell::ZERO);
        self.states[entity.index()] = EdictState::default();
    }

    /// Marks whether the spatial index links a record.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` if the record does not exist.
    pub fn set_linked(&mut self, entity: EntityIndex, linked: bool) -> Result<()> {
        let state = self
            .states
            .get_mut(entity.index())
            .ok_or_else(|| Error::new(ErrorKind::BadEntity(entity.get())))?;
        state.linked = linked;
        Ok(())
    }

    // =========================================================================
    // Field Access
    // =========================================================================

    fn base(&self, entity: EntityIndex) -> usize {
        entity.index() * self.layout.field_count
    }

    /// Bounds-checks a field span and returns its first cell index.
    fn locate(&self, entity: EntityIndex, field: u32, width: usize) -> Result<usize> {
        if entity.index() >= self.states.len() {
            return Err(Error::new(ErrorKind::BadEntity(entity.get())));
        }
        if field as usize + width > self.layout.field_count {
            return Err(Error::new(ErrorKind::BadField(field)));
        }
        Ok(self.base(entity) + field as usize)
    }

    /// Reads one field cell.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn get(&self, entity: EntityIndex, field: u32) -> Result<Cell> {
        Ok(self.cells[self.locate(entity, field, 1)?])
    }

    /// Writes one field cell.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn set(&mut self, entity: EntityIndex, field: u32, cell: Cell) -> Result<()> {
        let i = self.locate(entity, field, 1)?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Reads three field cells.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn get3(&self, entity: EntityIndex, field: u32) -> Result<[Cell; 3]> {
        let i = self.locate(entity, field, 3)?;
        Ok([self.cells[i], self.cells[i + 1], self.cells[i + 2]])
    }

    /// Writes three field cells.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn set3(&mut self, entity: EntityIndex, field: u32, cells: [Cell; 3]) -> Result<()> {
        let i = self.locate(entity, field, 3)?;
        self.cells[i..i + 3].copy_from_slice(&cells);
        Ok(())
    }

    /// Reads a float field.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn float(&self, entity: EntityIndex, field: u32) -> Result<f32> {
        self.get(entity, field).map(Cell::as_float)
    }

    /// Writes a float field.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn set_float(&mut self, entity: EntityIndex, field: u32, value: f32) -> Result<()> {
        self.set(entity, field, Cell::from_float(value))
    }

    /// Reads a vector field.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn vector(&self, entity: EntityIndex, field: u32) -> Result<Vec3> {
        let c = self.get3(entity, field)?;
        Ok([c[0].as_float(), c[1].as_float(), c[2].as_float()])
    }

    /// Writes a vector field.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the location is out of range.
    pub fn set_vector(&mut self, entity: EntityIndex, field: u32, value: Vec3) -> Result<()> {
        self.set3(entity, field, value.map(Cell::from_float))
    }

    /// Reads the cell a fat address points at.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the address is out of range.
    pub fn read(&self, addr: FieldAddress) -> Result<Cell> {
        let (entity, field) = addr.decode();
        self.get(entity, field)
    }

    /// Writes the cell a fat address points at.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the address is out of range.
    pub fn write(&mut self, addr: FieldAddress, cell: Cell) -> Result<()> {
        let (entity, field) = addr.decode();
        self.set(entity, field, cell)
    }

    /// Writes three cells starting where a fat address points.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` or `BadField` if the address is out of range.
    pub fn write3(&mut self, addr: FieldAddress, cells: [Cell; 3]) -> Result<()> {
        let (entity, field) = addr.decode();
        self.set3(entity, field, cells)
    }

    /// Returns a record's cells.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` if the record does not exist.
    pub fn record(&self, entity: EntityIndex) -> Result<&[Cell]> {
        let base = self.locate(entity, 0, 0)?;
        Ok(&self.cells[base..base + self.layout.field_count])
    }

    /// Returns a record's cells mutably.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` if the record does not exist.
    pub fn record_mut(&mut self, entity: EntityIndex) -> Result<&mut [Cell]> {
        let base = self.locate(entity, 0, 0)?;
        let count = self.layout.field_count;
        Ok(&mut self.cells[base..base + count])
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Iterates over records in use, world included.
    pub fn iter(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.free)
            .map(|(i, _)| EntityIndex::new(i as u32))
    }

    /// Returns the first record in use after `entity`.
    #[must_use]
    pub fn next_live(&self, entity: EntityIndex) -> Option<EntityIndex> {
        let start = entity.index() + 1;
        self.states
            .get(start..)?
            .iter()
            .position(|s| !s.free)
            .map(|i| EntityIndex::new((start + i) as u32))
    }
}

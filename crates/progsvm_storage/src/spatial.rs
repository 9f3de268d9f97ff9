//! Hook for the external spatial index.
//!
//! World collision lives outside the engine. The entity table only needs to
//! tell it when a record stops existing so the index drops its links.

use progsvm_foundation::EntityIndex;

/// Receives unlink notifications for freed entity records.
pub trait SpatialIndex {
    /// Removes every spatial link held for `entity`.
    fn unlink(&mut self, entity: EntityIndex);
}

/// A spatial index that tracks nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpatialIndex;

impl SpatialIndex for NoSpatialIndex {
    fn unlink(&mut self, _entity: EntityIndex) {}
}

//! Configuration for the entity table.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sizing and allocation policy for an [`EntityTable`](crate::EntityTable).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityConfig {
    /// Maximum number of records, world included.
    pub capacity: usize,

    /// Records at the bottom of the table that are never allocated or freed
    /// (the world plus any host-owned slots such as player records).
    pub reserved: usize,

    /// Minimum time a record stays free before it is preferred for reuse.
    pub free_hysteresis: f32,

    /// Records freed before this time are reusable at once. `0.0` disables it.
    pub startup_grace: f32,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            capacity: 600,
            reserved: 1,
            free_hysteresis: 0.5,
            startup_grace: 0.0,
        }
    }
}

impl EntityConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Builder method to set the reserved prefix. At least the world is always reserved.
    #[must_use]
    pub fn with_reserved(mut self, reserved: usize) -> Self {
        self.reserved = reserved.max(1);
        self
    }

    /// Builder method to set the reuse hysteresis window.
    #[must_use]
    pub fn with_free_hysteresis(mut self, seconds: f32) -> Self {
        self.free_hysteresis = seconds;
        self
    }

    /// Builder method to set the startup grace period.
    #[must_use]
    pub fn with_startup_grace(mut self, seconds: f32) -> Self {
        self.startup_grace = seconds;
        self
    }
}

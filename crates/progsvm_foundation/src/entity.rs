//! Entity record indices and packed field addresses.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of an entity record in the entity table.
///
/// Record 0 is the world. Indices are stable for the lifetime of a record;
/// a freed record keeps its index and may be handed out again later.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityIndex(u32);

impl EntityIndex {
    /// The reserved world entity.
    pub const WORLD: EntityIndex = EntityIndex(0);

    /// Creates an entity index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the index as `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the world entity.
    #[must_use]
    pub const fn is_world(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_world() {
            write!(f, "EntityIndex(world)")
        } else {
            write!(f, "EntityIndex({})", self.0)
        }
    }
}

impl fmt::Display for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edict {}", self.0)
    }
}

/// A pointer to one field of one entity record, packed into 32 bits.
///
/// # Layout
/// - bits 16..32: entity record index
/// - bits 0..16: field offset (in cells) within the record
///
/// This is the value `ADDRESS` produces and the `STOREP_*` opcodes consume.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldAddress(u32);

impl FieldAddress {
    /// Largest record index representable in an address.
    pub const MAX_ENTITY: u32 = 0xFFFF;
    /// Largest field offset representable in an address.
    pub const MAX_FIELD: u32 = 0xFFFF;

    /// Packs an entity index and a field offset.
    ///
    /// Returns `None` if either half does not fit in 16 bits.
    #[must_use]
    pub const fn encode(entity: EntityIndex, field: u32) -> Option<Self> {
        if entity.get() > Self::MAX_ENTITY || field > Self::MAX_FIELD {
            return None;
        }
        Some(Self((entity.get() << 16) | field))
    }

    /// Splits an address into its entity index and field offset.
    #[must_use]
    pub const fn decode(self) -> (EntityIndex, u32) {
        (EntityIndex::new(self.0 >> 16), self.0 & Self::MAX_FIELD)
    }

    /// Reinterprets raw cell bits as an address.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the packed bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the entity half.
    #[must_use]
    pub const fn entity(self) -> EntityIndex {
        self.decode().0
    }

    /// Returns the field half.
    #[must_use]
    pub const fn field(self) -> u32 {
        self.decode().1
    }
}

impl fmt::Debug for FieldAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (entity, field) = self.decode();
        write!(f, "FieldAddress({}.{})", entity.get(), field)
    }
}

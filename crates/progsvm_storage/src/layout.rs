//! Entity field layout.
//!
//! The program image decides how many cells each entity record has and
//! where each field lives. The engine itself only needs to know where a
//! handful of fields are: the ones it writes when running `STATE` or when
//! freeing a record.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Offsets of the entity fields the engine touches directly.
///
/// A field the program does not define is `None` and is simply skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemFields {
    /// `.float frame` - animation frame.
    pub frame: Option<u16>,
    /// `.void() think` - scheduled function.
    pub think: Option<u16>,
    /// `.float nextthink` - when `think` runs.
    pub nextthink: Option<u16>,
    /// `.string model`.
    pub model: Option<u16>,
    /// `.float modelindex`.
    pub modelindex: Option<u16>,
    /// `.float solid`.
    pub solid: Option<u16>,
    /// `.float takedamage`.
    pub takedamage: Option<u16>,
    /// `.vector origin`.
    pub origin: Option<u16>,
    /// `.vector angles`.
    pub angles: Option<u16>,
    /// `.string classname`.
    pub classname: Option<u16>,
}

impl SystemFields {
    /// Field names the engine resolves, in declaration order.
    pub const NAMES: [&'static str; 10] = [
        "frame",
        "think",
        "nextthink",
        "model",
        "modelindex",
        "solid",
        "takedamage",
        "origin",
        "angles",
        "classname",
    ];

    /// Resolves every system field through a name lookup.
    pub fn resolve(mut lookup: impl FnMut(&str) -> Option<u16>) -> Self {
        Self {
            frame: lookup("frame"),
            think: lookup("think"),
            nextthink: lookup("nextthink"),
            model: lookup("model"),
            modelindex: lookup("modelindex"),
            solid: lookup("solid"),
            takedamage: lookup("takedamage"),
            origin: lookup("origin"),
            angles: lookup("angles"),
            classname: lookup("classname"),
        }
    }

    /// Scalar fields cleared when a record is freed.
    #[must_use]
    pub fn cleared_scalars(&self) -> impl Iterator<Item = u16> + use<> {
        [
            self.model,
            self.modelindex,
            self.solid,
            self.takedamage,
            self.frame,
        ]
        .into_iter()
        .flatten()
    }

    /// Vector fields cleared when a record is freed.
    #[must_use]
    pub fn cleared_vectors(&self) -> impl Iterator<Item = u16> + use<> {
        [self.origin, self.angles].into_iter().flatten()
    }
}

/// Shape of every entity record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldLayout {
    /// Number of cells in each record.
    pub field_count: usize,
    /// Offsets of engine-known fields.
    pub system: SystemFields,
}

impl FieldLayout {
    /// Creates a layout with no engine-known fields.
    #[must_use]
    pub fn new(field_count: usize) -> Self {
        Self {
            field_count,
            system: SystemFields::default(),
        }
    }

    /// Sets the engine-known field offsets.
    #[must_use]
    pub fn with_system(mut self, system: SystemFields) -> Self {
        self.system = system;
        self
    }
}

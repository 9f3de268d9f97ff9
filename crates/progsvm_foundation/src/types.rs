//! Type tags for global and field definitions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The declared type of a global or entity field definition.
///
/// The engine never consults these at dispatch time; they exist so that
/// debugging output and name lookups can show values the way the program
/// meant them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DefType {
    /// No value.
    Void,
    /// String id.
    String,
    /// Float.
    Float,
    /// Three floats.
    Vector,
    /// Entity index.
    Entity,
    /// Field offset.
    Field,
    /// Function id.
    Function,
    /// Packed field address.
    Pointer,
}

impl DefType {
    /// Decodes a type from its numeric tag.
    #[must_use]
    pub const fn from_tag(tag: u16) -> Option<Self> {
        Some(match tag {
            0 => Self::Void,
            1 => Self::String,
            2 => Self::Float,
            3 => Self::Vector,
            4 => Self::Entity,
            5 => Self::Field,
            6 => Self::Function,
            7 => Self::Pointer,
            _ => return None,
        })
    }

    /// Returns the numeric tag.
    #[must_use]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Number of cells a value of this type occupies.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Vector => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for DefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Void => "void",
            Self::String => "string",
            Self::Float => "float",
            Self::Vector => "vector",
            Self::Entity => "entity",
            Self::Field => "field",
            Self::Function => "function",
            Self::Pointer => "pointer",
        };
        f.write_str(name)
    }
}

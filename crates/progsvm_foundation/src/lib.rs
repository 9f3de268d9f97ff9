//! Value cells, identifiers, fat addresses, strings, and errors for progsvm.
//!
//! This crate provides:
//! - [`Cell`] - The untyped 4-byte slot every program value lives in
//! - [`EntityIndex`], [`FunctionId`], [`StringId`] - Typed views of cell contents
//! - [`FieldAddress`] - Packed entity-record + field-offset pointers
//! - [`StringTable`] - The interned string pool
//! - [`DefType`] - Type tags of global and field definitions
//! - [`Error`] - Fatal execution errors with diagnostic context
//! - [`ofs`] - Well-known global segment offsets

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod intern;
pub mod ofs;
pub mod types;
pub mod value;

pub use entity::{EntityIndex, FieldAddress};
pub use error::{Error, ErrorContext, ErrorKind, VmLimit};
pub use intern::{StringId, StringTable};
pub use types::DefType;
pub use value::{Cell, FunctionId, Vec3};

/// Result type for progsvm operations.
pub type Result<T> = std::result::Result<T, Error>;

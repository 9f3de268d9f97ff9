//! Global segment, entity field layout, and entity table for progsvm.
//!
//! This crate provides:
//! - [`GlobalSegment`] - The flat cell array shared by every function
//! - [`FieldLayout`] - Per-record field count and engine-known field offsets
//! - [`EntityTable`] - Fixed-capacity arena of entity records
//! - [`SpatialIndex`] - Hook for the external spatial index

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod entity;
pub mod globals;
pub mod layout;
pub mod spatial;

pub use config::EntityConfig;
pub use entity::{EdictState, EntityTable};
pub use globals::GlobalSegment;
pub use layout::{FieldLayout, SystemFields};
pub use spatial::{NoSpatialIndex, SpatialIndex};

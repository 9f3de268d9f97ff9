//! Think scheduling, frame loop, and snapshots for progsvm.
//!
//! This crate provides:
//! - [`Session`] - A VM plus the clock that drives entity thinks
//! - [`Snapshot`] - Globals, entities, and strings saved as `MessagePack`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod session;
pub mod snapshot;

pub use session::Session;
pub use snapshot::{Snapshot, from_bytes, load_from_file, save_to_file, to_bytes};

//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Cell, EntityIndex, FieldAddress, StringTable, Error.

mod addresses;
mod cells;
mod errors;
mod strings;

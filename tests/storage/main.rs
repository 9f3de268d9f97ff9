//! Integration tests for Layer 1: Storage
//!
//! Tests for the global segment and the entity table.

mod entities;
mod globals;

//! progsvm - Bytecode execution engine for compiled game-logic programs
//!
//! This crate re-exports all layers of the progsvm system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: progsvm_runtime    — Session: think scheduling, frame loop, snapshots
//!          progsvm_stdlib     — Reference builtins
//! Layer 3: progsvm_debug      — Disassembly, tracing, profiling, entity dumps
//! Layer 2: progsvm_vm         — Program image, call/locals stacks, execute loop
//! Layer 1: progsvm_storage    — Global segment, entity table
//! Layer 0: progsvm_foundation — Core types (Cell, EntityIndex, Error)
//! ```

pub use progsvm_debug as debug;
pub use progsvm_foundation as foundation;
pub use progsvm_runtime as runtime;
pub use progsvm_stdlib as stdlib;
pub use progsvm_storage as storage;
pub use progsvm_vm as vm;

//! Statement disassembly, execution tracing, profiling, and entity dumps for progsvm.
//!
//! This crate provides:
//! - [`disasm`] - One-line statement listings with operand names and values
//! - [`Tracer`] - An execution observer recording into a ring buffer
//! - [`profile`] - Per-function statement counts, busiest first
//! - [`entity`] - Entity records listed by field name

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod disasm;
pub mod entity;
pub mod profile;
pub mod trace;

pub use config::{TraceOutput, TracerConfig};
pub use disasm::{disassemble_function, format_statement, format_value};
pub use entity::{format_entity, format_entities};
pub use profile::{ProfileEntry, report, top_functions};
pub use trace::{HumanFormatter, TraceBuffer, TraceEvent, TraceFormatter, TraceRecord, Tracer};

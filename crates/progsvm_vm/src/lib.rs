//! Program image, call stacks, and bytecode execution engine for progsvm.
//!
//! This crate provides:
//! - [`Opcode`] - The instruction set
//! - [`Program`] - A validated, immutable program image
//! - [`ProgramBuilder`] - Hand assembly of program images
//! - [`CallStack`], [`LocalsStack`] - Return frames and saved locals
//! - [`Vm`] - The fetch-decode-execute loop and the native call boundary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod config;
pub mod opcode;
pub mod program;
pub mod stack;
pub mod vm;

pub use builder::{FieldRef, ProgramBuilder};
pub use config::VmConfig;
pub use opcode::{Opcode, Operand};
pub use program::{Def, Function, Program, ProgramParts, Statement, SystemGlobals};
pub use stack::{CallStack, Frame, LocalsStack};
pub use vm::{Builtin, BuiltinFn, Builtins, ExecObserver, FunctionProfile, StatementEvent, Vm};

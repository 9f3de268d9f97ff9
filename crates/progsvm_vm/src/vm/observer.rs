//! Execution observer hook.
//!
//! The VM reports statements, calls, and returns to an optional observer
//! while tracing is switched on. With tracing off the hook costs one branch
//! per statement.

use std::any::Any;

use progsvm_foundation::{FunctionId, StringTable};
use progsvm_storage::GlobalSegment;

use crate::program::{Program, Statement};

/// A statement about to execute.
#[derive(Clone, Copy, Debug)]
pub struct StatementEvent<'a> {
    /// Index in the statement stream.
    pub index: usize,
    /// The statement itself.
    pub statement: Statement,
    /// Function it belongs to.
    pub function: FunctionId,
    /// Call stack depth.
    pub depth: usize,
    /// Global segment before the statement runs.
    pub globals: &'a GlobalSegment,
    /// Program being executed.
    pub program: &'a Program,
    /// Program strings plus strings created at run time.
    pub strings: &'a StringTable,
}

/// Receives execution events.
///
/// Every method has an empty default so observers implement only what they
/// record.
pub trait ExecObserver: Any {
    /// Called before each statement.
    fn on_statement(&mut self, _event: &StatementEvent<'_>) {}

    /// Called after a function has been entered.
    fn on_enter(&mut self, _function: FunctionId, _depth: usize, _program: &Program) {}

    /// Called after a function has returned to its caller.
    fn on_leave(&mut self, _function: FunctionId, _depth: usize, _program: &Program) {}

    /// Called before a builtin runs.
    fn on_builtin(&mut self, _index: u32, _name: &str) {}

    /// Upcast for downcasting to the concrete observer.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete observer.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

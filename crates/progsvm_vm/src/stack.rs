//! Call stack and locals save area.
//!
//! Functions keep their parameters and locals at fixed global offsets, so a
//! recursive or re-entrant call would clobber its caller's values. Entering a
//! function copies its local range onto the [`LocalsStack`]; leaving copies it
//! back. The [`CallStack`] only remembers where to resume.

use progsvm_foundation::{Cell, Error, ErrorKind, FunctionId, Result, VmLimit};

/// One call stack entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Statement that made the call; execution resumes after it.
    pub return_statement: usize,
    /// Function that was running when the call was made.
    pub function: FunctionId,
}

/// Bounded stack of call frames.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<Frame>,
    limit: usize,
}

impl CallStack {
    /// Creates an empty stack holding at most `limit` frames.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Current depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Maximum depth.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true if no frames are on the stack.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns true if another push would overflow.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.limit
    }

    /// Pushes a frame.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded(CallDepth)` if the stack is full.
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        if self.is_full() {
            return Err(Error::limit_exceeded(VmLimit::CallDepth { limit: self.limit }));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pops a frame.
    ///
    /// # Errors
    ///
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop(&mut self) -> Result<Frame> {
        self.frames
            .pop()
            .ok_or_else(|| Error::new(ErrorKind::StackUnderflow))
    }

    /// Frames from outermost to innermost.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

/// Bounded flat buffer of saved local cells.
#[derive(Clone, Debug)]
pub struct LocalsStack {
    cells: Vec<Cell>,
    limit: usize,
}

impl LocalsStack {
    /// Creates an empty save area holding at most `limit` cells.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            cells: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Cells currently saved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Maximum number of cells.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns true if `len` more cells fit.
    #[must_use]
    pub fn has_room(&self, len: usize) -> bool {
        self.cells.len() + len <= self.limit
    }

    /// Saves a run of cells.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded(LocalsStack)` if the cells do not fit. Nothing
    /// is saved in that case.
    pub fn save(&mut self, cells: &[Cell]) -> Result<()> {
        if !self.has_room(cells.len()) {
            return Err(Error::limit_exceeded(VmLimit::LocalsStack { limit: self.limit }));
        }
        self.cells.extend_from_slice(cells);
        Ok(())
    }

    /// Pops the most recently saved `dst.len()` cells into `dst`.
    ///
    /// # Errors
    ///
    /// Returns `LocalsUnderflow` if fewer cells are saved.
    pub fn restore(&mut self, dst: &mut [Cell]) -> Result<()> {
        let Some(start) = self.cells.len().checked_sub(dst.len()) else {
            return Err(Error::new(ErrorKind::LocalsUnderflow));
        };
        dst.copy_from_slice(&self.cells[start..]);
        self.cells.truncate(start);
        Ok(())
    }
}

//! Error types for progsvm.
//!
//! Every execution error is fatal to the top-level call that raised it.
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityIndex;

/// The main error type for progsvm operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: VmLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Creates an error raised by a builtin function.
    #[must_use]
    pub fn builtin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Builtin(message.into()))
    }

    /// Creates an invalid program error.
    #[must_use]
    pub fn invalid_program(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidProgram(message.into()))
    }

    /// Returns true if this error is the given limit kind.
    #[must_use]
    pub fn is_limit(&self, f: impl FnOnce(&VmLimit) -> bool) -> bool {
        matches!(&self.kind, ErrorKind::LimitExceeded(limit) if f(limit))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The statement's opcode is not part of the instruction set.
    #[error("bad opcode {0}")]
    BadOpcode(u16),

    /// A call went through function 0.
    #[error("NULL function")]
    NullFunction,

    /// A function id does not exist in the function table.
    #[error("bad function index {0}")]
    BadFunction(u32),

    /// No function has the requested name.
    #[error("unknown function {0}")]
    UnknownFunction(String),

    /// A native index is out of range or has no registered builtin.
    #[error("bad builtin call number {0}")]
    BadBuiltin(u32),

    /// Leaving a function with an empty call stack.
    #[error("call stack underflow")]
    StackUnderflow,

    /// Leaving a function whose locals were never saved.
    #[error("locals stack underflow")]
    LocalsUnderflow,

    /// `ADDRESS` formed a pointer into the world entity while active.
    #[error("assignment to world entity")]
    AssignmentToWorld,

    /// An entity index is outside the allocated table.
    #[error("bad entity reference {0}")]
    BadEntity(u32),

    /// A field offset is outside the entity record.
    #[error("bad field offset {0}")]
    BadField(u32),

    /// Freeing or otherwise misusing a reserved entity record.
    #[error("{0} is reserved")]
    ReservedEntity(EntityIndex),

    /// A resource limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(VmLimit),

    /// The program image is not internally consistent.
    #[error("invalid program: {0}")]
    InvalidProgram(String),

    /// A builtin function reported an error.
    #[error("{0}")]
    Builtin(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// I/O error (file operations).
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Resource limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmLimit {
    /// Instruction budget of one top-level execution exhausted.
    Runaway {
        /// The configured budget.
        limit: u32,
    },
    /// Call stack depth exceeded.
    CallDepth {
        /// The configured depth.
        limit: usize,
    },
    /// Locals save area exhausted.
    LocalsStack {
        /// The configured size in cells.
        limit: usize,
    },
    /// No free entity record and the table is full.
    Edicts {
        /// The table capacity.
        limit: usize,
    },
}

impl fmt::Display for VmLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runaway { limit } => write!(f, "runaway loop ({limit} instructions)"),
            Self::CallDepth { limit } => write!(f, "stack overflow (depth {limit})"),
            Self::LocalsStack { limit } => {
                write!(f, "locals stack overflow ({limit} cells)")
            }
            Self::Edicts { limit } => write!(f, "no free edicts (capacity {limit})"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Name of the function executing when the error was raised.
    pub function: Option<String>,
    /// Index of the statement executing when the error was raised.
    pub statement: Option<usize>,
    /// The entity bound to `self` at the time.
    pub entity: Option<EntityIndex>,
    /// Call stack, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the executing function.
    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    /// Sets the executing statement.
    #[must_use]
    pub fn with_statement(mut self, statement: usize) -> Self {
        self.statement = Some(statement);
        self
    }

    /// Sets the owning entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityIndex) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(function) = &self.function {
            write!(f, "in {function}")?;
            if let Some(statement) = self.statement {
                write!(f, " at statement {statement}")?;
            }
        }
        if let Some(entity) = self.entity {
            write!(f, " (self = {entity})")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

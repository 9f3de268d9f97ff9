//! Trace event and record types.

use progsvm_foundation::FunctionId;

// =============================================================================
// Trace Event
// =============================================================================

/// Events the VM reports while tracing is on.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// A statement is about to execute.
    Statement {
        /// Index in the statement stream.
        index: usize,
        /// Function the statement belongs to.
        function: FunctionId,
        /// Call stack depth.
        depth: usize,
        /// Disassembly with operand values before execution.
        text: String,
    },

    /// A function was entered.
    Enter {
        /// The callee.
        function: FunctionId,
        /// The callee's name.
        name: String,
        /// Call stack depth after entering.
        depth: usize,
    },

    /// A function returned.
    Leave {
        /// The function that returned.
        function: FunctionId,
        /// Its name.
        name: String,
        /// Call stack depth after leaving.
        depth: usize,
    },

    /// A builtin is about to run.
    Builtin {
        /// Builtin number.
        index: u32,
        /// Registered name.
        name: String,
    },
}

impl TraceEvent {
    /// Returns the event type name, for filtering.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Statement { .. } => "statement",
            Self::Enter { .. } => "enter",
            Self::Leave { .. } => "leave",
            Self::Builtin { .. } => "builtin",
        }
    }

    /// Returns the call depth the event happened at, if it has one.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        match self {
            Self::Statement { depth, .. }
            | Self::Enter { depth, .. }
            | Self::Leave { depth, .. } => Some(*depth),
            Self::Builtin { .. } => None,
        }
    }
}

// =============================================================================
// Trace Record
// =============================================================================

/// A recorded trace event with its sequence number and timestamp.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Monotonically increasing record id.
    pub id: u64,
    /// Nanoseconds since the tracer was created.
    pub timestamp_ns: u64,
    /// The event.
    pub event: TraceEvent,
}

impl TraceRecord {
    /// Creates a new trace record.
    #[must_use]
    pub fn new(id: u64, timestamp_ns: u64, event: TraceEvent) -> Self {
        Self {
            id,
            timestamp_ns,
            event,
        }
    }

    /// Returns the event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

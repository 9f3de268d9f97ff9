//! Execution tracing.
//!
//! [`Tracer`] is an [`ExecObserver`]: installed on a VM with tracing
//! switched on, it records every statement (disassembled with the operand
//! values it is about to read), every call and return, and every builtin
//! invocation into a ring buffer. Records can also be echoed to stderr as
//! they happen.
//!
//! # Example
//!
//! ```text
//! vm.set_observer(Box::new(Tracer::new(TracerConfig::new().enabled())));
//! vm.set_trace(true);           // or the program calls traceon()
//! vm.execute(function)?;
//! let tracer = vm.observer::<Tracer>().unwrap();
//! println!("{}", tracer.format_records(&tracer.buffer().recent(20)));
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::any::Any;
use std::io::{self, Write};
use std::time::Instant;

use progsvm_foundation::FunctionId;
use progsvm_vm::{ExecObserver, Program, StatementEvent};

use crate::config::{TraceOutput, TracerConfig};
use crate::disasm::format_statement;

// =============================================================================
// Tracer
// =============================================================================

/// Records execution events into a ring buffer.
#[derive(Debug)]
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    start_time: Instant,
    formatter: HumanFormatter,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer = TraceBuffer::new(config.buffer_size);
        Self {
            config,
            buffer,
            start_time: Instant::now(),
            formatter: HumanFormatter::new(),
        }
    }

    /// Creates a disabled tracer.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Creates an enabled tracer that echoes to stderr.
    #[must_use]
    pub fn to_stderr() -> Self {
        Self::new(TracerConfig::new().enabled().to_stderr())
    }

    /// Returns true if tracing is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Sets the trace output destination.
    pub fn set_output(&mut self, output: TraceOutput) {
        self.config.output = output;
    }

    /// Replaces the formatter used for echoed and formatted records.
    pub fn set_formatter(&mut self, formatter: HumanFormatter) {
        self.formatter = formatter;
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Records a trace event.
    ///
    /// Does nothing while disabled.
    #[inline]
    pub fn record(&mut self, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        self.record_internal(event);
    }

    fn record_internal(&mut self, event: TraceEvent) {
        if !self.wants(event.event_type()) {
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        let id = self.buffer.push(timestamp_ns, event);

        if self.config.output == TraceOutput::Stderr {
            if let Some(record) = self.buffer.last().filter(|r| r.id == id) {
                let line = self.formatter.format(record);
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
    }

    /// Whether events of this type pass the filter.
    fn wants(&self, event_type: &str) -> bool {
        self.config.event_filter.is_empty()
            || self.config.event_filter.iter().any(|t| t == event_type)
    }

    /// Formats a record with the current formatter.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        self.formatter.format(record)
    }

    /// Formats several records, one per line.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        self.formatter.format_many(records)
    }

    /// Returns the trace buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Clears the trace buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.buffer.stats()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

// =============================================================================
// Observer
// =============================================================================

impl ExecObserver for Tracer {
    fn on_statement(&mut self, event: &StatementEvent<'_>) {
        if !self.config.enabled || !self.wants("statement") {
            return;
        }
        let text = format_statement(
            event.program,
            event.strings,
            Some(event.globals),
            event.index,
            &event.statement,
        );
        self.record_internal(TraceEvent::Statement {
            index: event.index,
            function: event.function,
            depth: event.depth,
            text,
        });
    }

    fn on_enter(&mut self, function: FunctionId, depth: usize, program: &Program) {
        self.record(TraceEvent::Enter {
            function,
            name: program.function_name(function).to_string(),
            depth,
        });
    }

    fn on_leave(&mut self, function: FunctionId, depth: usize, program: &Program) {
        self.record(TraceEvent::Leave {
            function,
            name: program.function_name(function).to_string(),
            depth,
        });
    }

    fn on_builtin(&mut self, index: u32, name: &str) {
        self.record(TraceEvent::Builtin {
            index,
            name: name.to_string(),
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Configuration for the virtual machine.

use progsvm_storage::EntityConfig;

/// Execution limits and policy for a [`Vm`](crate::Vm).
#[derive(Clone, Debug, PartialEq)]
pub struct VmConfig {
    /// Statements one top-level `execute` may run before it is aborted.
    pub runaway_limit: u32,

    /// Maximum call stack depth.
    pub max_call_depth: usize,

    /// Capacity of the locals save area, in cells.
    pub locals_stack_size: usize,

    /// Delay `STATE` adds to the clock when scheduling the next think.
    pub state_interval: f32,

    /// Seed for the deterministic random generator natives draw from.
    pub seed: u64,

    /// Entity table sizing and reuse policy.
    pub entities: EntityConfig,

    /// Start with statement tracing on.
    pub trace: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            runaway_limit: 100_000,
            max_call_depth: 32,
            locals_stack_size: 2048,
            state_interval: 0.1,
            seed: 0,
            entities: EntityConfig::default(),
            trace: false,
        }
    }
}

impl VmConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the runaway budget.
    #[must_use]
    pub fn with_runaway_limit(mut self, limit: u32) -> Self {
        self.runaway_limit = limit;
        self
    }

    /// Builder method to set the maximum call depth.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder method to set the locals save area size.
    #[must_use]
    pub fn with_locals_stack_size(mut self, cells: usize) -> Self {
        self.locals_stack_size = cells;
        self
    }

    /// Builder method to set the `STATE` think interval.
    #[must_use]
    pub fn with_state_interval(mut self, seconds: f32) -> Self {
        self.state_interval = seconds;
        self
    }

    /// Builder method to set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the entity table policy.
    #[must_use]
    pub fn with_entities(mut self, entities: EntityConfig) -> Self {
        self.entities = entities;
        self
    }

    /// Builder method to enable statement tracing from the start.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

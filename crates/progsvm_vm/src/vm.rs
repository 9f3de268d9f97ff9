//! The execution engine.
//!
//! [`Vm::execute`] runs one function to completion. Statements address the
//! global segment directly; entity fields are reached through `LOAD`,
//! `ADDRESS`, and the indirect stores. Calls save the callee's fixed local
//! range on the locals stack and push a return frame; returns undo both.
//!
//! Builtins receive `&mut Vm` and may call `execute` again. Each call of
//! `execute` remembers the call depth it started at, owns its own runaway
//! budget, and on error unwinds back to that depth before returning.

#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::float_cmp)]

mod native;
mod observer;

pub use native::{Builtin, BuiltinFn, Builtins};
pub use observer::{ExecObserver, StatementEvent};

use std::sync::Arc;

use progsvm_foundation::ofs::{self, OFS_RETURN, SLOT_SIZE};
use progsvm_foundation::{
    Cell, EntityIndex, Error, ErrorContext, ErrorKind, FieldAddress, FunctionId, Result,
    StringId, StringTable, VmLimit,
};
use progsvm_storage::{EntityTable, GlobalSegment, NoSpatialIndex, SpatialIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, trace};

use crate::config::VmConfig;
use crate::opcode::Opcode;
use crate::program::Program;
use crate::stack::{CallStack, Frame, LocalsStack};

/// Per-function execution counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FunctionProfile {
    /// Times the function was called.
    pub calls: u64,
    /// Statements executed inside the function.
    pub statements: u64,
}

/// The progs virtual machine.
pub struct Vm {
    program: Arc<Program>,
    globals: GlobalSegment,
    entities: EntityTable,
    /// Program strings plus strings created at run time.
    strings: StringTable,
    stack: CallStack,
    locals: LocalsStack,
    builtins: Arc<Builtins>,
    config: VmConfig,
    /// Function whose statements are executing.
    function: FunctionId,
    /// Statement executing, for diagnostics and return frames.
    statement: usize,
    /// Arguments passed by the pending call.
    argc: usize,
    profile: Vec<FunctionProfile>,
    output: Vec<String>,
    rng: ChaCha8Rng,
    /// Set once the world is spawned; `ADDRESS` then rejects the world.
    active: bool,
    trace: bool,
    observer: Option<Box<dyn ExecObserver>>,
    spatial: Box<dyn SpatialIndex>,
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("function", &self.function)
            .field("statement", &self.statement)
            .field("depth", &self.stack.depth())
            .field("entities", &self.entities.len())
            .field("active", &self.active)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl Vm {
    /// Creates a VM over a program with a builtin table.
    ///
    /// The global segment starts as the program's initial globals and the
    /// entity table holds only its reserved records.
    #[must_use]
    pub fn new(program: Arc<Program>, builtins: Arc<Builtins>, config: VmConfig) -> Self {
        let globals = GlobalSegment::from_cells(program.globals().to_vec());
        let entities = EntityTable::new(program.field_layout(), config.entities.clone());
        let strings = program.strings().clone();
        let profile = vec![FunctionProfile::default(); program.functions().len()];

        Self {
            globals,
            entities,
            strings,
            stack: CallStack::new(config.max_call_depth),
            locals: LocalsStack::new(config.locals_stack_size),
            builtins,
            function: FunctionId::NULL,
            statement: 0,
            argc: 0,
            profile,
            output: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            active: false,
            trace: config.trace,
            observer: None,
            spatial: Box::new(NoSpatialIndex),
            program,
            config,
        }
    }

    /// Replaces the spatial index notified when entities are freed.
    #[must_use]
    pub fn with_spatial_index(mut self, spatial: Box<dyn SpatialIndex>) -> Self {
        self.spatial = spatial;
        self
    }

    // =========================================================================
    // State Access
    // =========================================================================

    /// Returns the program.
    #[must_use]
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Returns the builtin table.
    #[must_use]
    pub fn builtins(&self) -> &Arc<Builtins> {
        &self.builtins
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Returns the global segment.
    #[must_use]
    pub fn globals(&self) -> &GlobalSegment {
        &self.globals
    }

    /// Returns the global segment mutably.
    pub fn globals_mut(&mut self) -> &mut GlobalSegment {
        &mut self.globals
    }

    /// Returns the entity table.
    #[must_use]
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// Returns the entity table mutably.
    pub fn entities_mut(&mut self) -> &mut EntityTable {
        &mut self.entities
    }

    /// Replaces globals, entities, and strings wholesale, as when restoring
    /// a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the state does not fit this program.
    /// The VM is unchanged in that case.
    pub fn restore_state(
        &mut self,
        globals: GlobalSegment,
        entities: EntityTable,
        strings: StringTable,
    ) -> Result<()> {
        self.program.check_state(&globals, &entities)?;
        self.globals = globals;
        self.entities = entities;
        self.strings = strings;
        Ok(())
    }

    /// Returns the string pool, runtime strings included.
    #[must_use]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Resolves a string id.
    #[must_use]
    pub fn string(&self, id: StringId) -> &str {
        self.strings.resolve(id)
    }

    /// Current call stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Cells currently held in the locals save area.
    #[must_use]
    pub fn locals_depth(&self) -> usize {
        self.locals.len()
    }

    /// The executing function, or the null function between executions.
    #[must_use]
    pub fn current_function(&self) -> FunctionId {
        self.function
    }

    /// Index of the executing statement.
    #[must_use]
    pub fn current_statement(&self) -> usize {
        self.statement
    }

    /// Returns true once the world is spawned.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the world as spawned. While active, `ADDRESS` rejects the world entity.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Returns true while statement tracing is on.
    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    /// Switches statement tracing on or off.
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// Installs an observer for traced execution.
    pub fn set_observer(&mut self, observer: Box<dyn ExecObserver>) {
        self.observer = Some(observer);
    }

    /// Removes and returns the observer.
    pub fn take_observer(&mut self) -> Option<Box<dyn ExecObserver>> {
        self.observer.take()
    }

    /// Returns the observer if it is a `T`.
    #[must_use]
    pub fn observer<T: ExecObserver>(&self) -> Option<&T> {
        self.observer.as_ref()?.as_any().downcast_ref()
    }

    /// Returns the observer mutably if it is a `T`.
    pub fn observer_mut<T: ExecObserver>(&mut self) -> Option<&mut T> {
        self.observer.as_mut()?.as_any_mut().downcast_mut()
    }

    /// The random generator builtins draw from.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Lines printed by builtins.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Takes and clears the printed lines.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Per-function counters, indexed by function id.
    #[must_use]
    pub fn profile(&self) -> &[FunctionProfile] {
        &self.profile
    }

    /// Zeroes every profile counter.
    pub fn reset_profile(&mut self) {
        self.profile.fill(FunctionProfile::default());
    }

    // =========================================================================
    // System Globals
    // =========================================================================

    /// The program clock, or 0 if the program declares no `time` global.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.program
            .system_globals()
            .time
            .map_or(0.0, |ofs| self.globals.float(ofs as usize))
    }

    /// Sets the program clock.
    pub fn set_time(&mut self, time: f32) {
        if let Some(ofs) = self.program.system_globals().time {
            self.globals.set_float(ofs as usize, time);
        }
    }

    /// The entity bound to `self`, or the world if the program has no `self`.
    #[must_use]
    pub fn self_entity(&self) -> EntityIndex {
        self.program
            .system_globals()
            .self_entity
            .map_or(EntityIndex::WORLD, |ofs| self.globals.entity(ofs as usize))
    }

    /// Binds `self`.
    pub fn set_self(&mut self, entity: EntityIndex) {
        if let Some(ofs) = self.program.system_globals().self_entity {
            self.globals.set_entity(ofs as usize, entity);
        }
    }

    /// Binds `other`.
    pub fn set_other(&mut self, entity: EntityIndex) {
        if let Some(ofs) = self.program.system_globals().other {
            self.globals.set_entity(ofs as usize, entity);
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs a function to completion.
    ///
    /// A program function runs until its matching return; a builtin is
    /// invoked directly. The function receives as many arguments as it
    /// declares, read from the parameter slots.
    ///
    /// # Errors
    ///
    /// Any failure is fatal to this call. The error carries the function,
    /// statement, `self` entity, and stack trace where it was raised, and
    /// the call and locals stacks are unwound to where they were on entry.
    pub fn execute(&mut self, function: FunctionId) -> Result<()> {
        let entry_depth = self.stack.depth();
        match self.run(function, entry_depth) {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = self.decorate(err);
                self.unwind(entry_depth);
                Err(err)
            }
        }
    }

    /// Runs a function found by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFunction` if no function has that name, or whatever
    /// [`execute`](Self::execute) returns.
    pub fn execute_named(&mut self, name: &str) -> Result<()> {
        let function = self
            .program
            .find_function(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(name.to_string())))?;
        self.execute(function)
    }

    fn run(&mut self, function: FunctionId, entry_depth: usize) -> Result<()> {
        let program = Arc::clone(&self.program);
        let f = *program.function(function)?;
        self.argc = f.num_parms as usize;

        if let Some(index) = f.builtin_index() {
            return self.call_builtin(function, index);
        }

        let mut s = self.enter(function)?;
        let mut budget = self.config.runaway_limit;

        loop {
            if budget == 0 {
                return Err(Error::limit_exceeded(VmLimit::Runaway {
                    limit: self.config.runaway_limit,
                }));
            }
            budget -= 1;

            let st = *program
                .statement(s)
                .ok_or_else(|| Error::invalid_program(format!("statement {s} out of range")))?;
            self.statement = s;
            self.profile[self.function.index()].statements += 1;

            if self.trace {
                if let Some(observer) = self.observer.as_mut() {
                    observer.on_statement(&StatementEvent {
                        index: s,
                        statement: st,
                        function: self.function,
                        depth: self.stack.depth(),
                        globals: &self.globals,
                        program: program.as_ref(),
                        strings: &self.strings,
                    });
                }
            }

            let op = st
                .opcode()
                .ok_or_else(|| Error::new(ErrorKind::BadOpcode(st.op)))?;
            let (a, b, c) = (st.a as usize, st.b as usize, st.c as usize);
            let g = &mut self.globals;
            let mut next = s + 1;

            match op {
                // ---- arithmetic ----
                Opcode::AddF => {
                    let v = g.float(a) + g.float(b);
                    g.set_float(c, v);
                }
                Opcode::AddV => {
                    let (x, y) = (g.vector(a), g.vector(b));
                    g.set_vector(c, [x[0] + y[0], x[1] + y[1], x[2] + y[2]]);
                }
                Opcode::SubF => {
                    let v = g.float(a) - g.float(b);
                    g.set_float(c, v);
                }
                Opcode::SubV => {
                    let (x, y) = (g.vector(a), g.vector(b));
                    g.set_vector(c, [x[0] - y[0], x[1] - y[1], x[2] - y[2]]);
                }
                Opcode::MulF => {
                    let v = g.float(a) * g.float(b);
                    g.set_float(c, v);
                }
                Opcode::MulV => {
                    let (x, y) = (g.vector(a), g.vector(b));
                    g.set_float(c, x[0] * y[0] + x[1] * y[1] + x[2] * y[2]);
                }
                Opcode::MulFV => {
                    let (k, v) = (g.float(a), g.vector(b));
                    g.set_vector(c, [k * v[0], k * v[1], k * v[2]]);
                }
                Opcode::MulVF => {
                    let (v, k) = (g.vector(a), g.float(b));
                    g.set_vector(c, [k * v[0], k * v[1], k * v[2]]);
                }
                Opcode::DivF => {
                    let v = g.float(a) / g.float(b);
                    g.set_float(c, v);
                }
                Opcode::BitAnd => {
                    let v = (g.float(a) as i32) & (g.float(b) as i32);
                    g.set_float(c, v as f32);
                }
                Opcode::BitOr => {
                    let v = (g.float(a) as i32) | (g.float(b) as i32);
                    g.set_float(c, v as f32);
                }

                // ---- comparison ----
                Opcode::Ge => set_bool(g.float(a) >= g.float(b), g, c),
                Opcode::Le => set_bool(g.float(a) <= g.float(b), g, c),
                Opcode::Gt => set_bool(g.float(a) > g.float(b), g, c),
                Opcode::Lt => set_bool(g.float(a) < g.float(b), g, c),
                Opcode::And => set_bool(g.float(a) != 0.0 && g.float(b) != 0.0, g, c),
                Opcode::Or => set_bool(g.float(a) != 0.0 || g.float(b) != 0.0, g, c),
                Opcode::EqF => set_bool(g.float(a) == g.float(b), g, c),
                Opcode::EqV => set_bool(g.vector(a) == g.vector(b), g, c),
                Opcode::EqS => {
                    let eq = self.strings.resolve(g.string(a)) == self.strings.resolve(g.string(b));
                    set_bool(eq, g, c);
                }
                Opcode::EqE | Opcode::EqFnc => set_bool(g.int(a) == g.int(b), g, c),
                Opcode::NeF => set_bool(g.float(a) != g.float(b), g, c),
                Opcode::NeV => set_bool(g.vector(a) != g.vector(b), g, c),
                Opcode::NeS => {
                    let ne = self.strings.resolve(g.string(a)) != self.strings.resolve(g.string(b));
                    set_bool(ne, g, c);
                }
                Opcode::NeE | Opcode::NeFnc => set_bool(g.int(a) != g.int(b), g, c),

                // ---- not ----
                Opcode::NotF => set_bool(g.float(a) == 0.0, g, c),
                Opcode::NotV => set_bool(g.vector(a) == [0.0; 3], g, c),
                Opcode::NotS => {
                    let id = g.string(a);
                    set_bool(id.is_null() || self.strings.resolve(id).is_empty(), g, c);
                }
                Opcode::NotEnt => set_bool(g.entity(a).is_world(), g, c),
                Opcode::NotFnc => set_bool(g.function(a).is_null(), g, c),

                // ---- store ----
                Opcode::StoreF
                | Opcode::StoreS
                | Opcode::StoreEnt
                | Opcode::StoreFld
                | Opcode::StoreFnc => {
                    let v = g.get(a);
                    g.set(b, v);
                }
                Opcode::StoreV => g.copy(a, b, 3),

                Opcode::StorePF
                | Opcode::StorePS
                | Opcode::StorePEnt
                | Opcode::StorePFld
                | Opcode::StorePFnc => {
                    let addr = FieldAddress::from_bits(g.get(b).bits());
                    self.entities.write(addr, g.get(a))?;
                }
                Opcode::StorePV => {
                    let addr = FieldAddress::from_bits(g.get(b).bits());
                    self.entities.write3(addr, [g.get(a), g.get(a + 1), g.get(a + 2)])?;
                }

                // ---- load ----
                Opcode::LoadF
                | Opcode::LoadS
                | Opcode::LoadEnt
                | Opcode::LoadFld
                | Opcode::LoadFnc => {
                    let v = self.entities.get(g.entity(a), field_offset(g.get(b)))?;
                    g.set(c, v);
                }
                Opcode::LoadV => {
                    let v = self.entities.get3(g.entity(a), field_offset(g.get(b)))?;
                    g.write_slice(c, &v);
                }
                Opcode::Address => {
                    let entity = g.entity(a);
                    let field = field_offset(g.get(b));
                    if entity.is_world() && self.active {
                        return Err(Error::new(ErrorKind::AssignmentToWorld));
                    }
                    if entity.index() >= self.entities.len() {
                        return Err(Error::new(ErrorKind::BadEntity(entity.get())));
                    }
                    if field as usize >= self.entities.layout().field_count {
                        return Err(Error::new(ErrorKind::BadField(field)));
                    }
                    let addr = FieldAddress::encode(entity, field)
                        .ok_or_else(|| Error::new(ErrorKind::BadField(field)))?;
                    g.set(c, Cell::from_bits(addr.bits()));
                }

                // ---- branch ----
                Opcode::If => {
                    if g.int(a) != 0 {
                        next = jump(s, st.delta_b());
                    }
                }
                Opcode::IfNot => {
                    if g.int(a) == 0 {
                        next = jump(s, st.delta_b());
                    }
                }
                Opcode::Goto => next = jump(s, st.delta_a()),

                // ---- call ----
                Opcode::Call0
                | Opcode::Call1
                | Opcode::Call2
                | Opcode::Call3
                | Opcode::Call4
                | Opcode::Call5
                | Opcode::Call6
                | Opcode::Call7
                | Opcode::Call8 => {
                    self.argc = op.call_argc().unwrap_or(0);
                    let callee = g.function(a);
                    let f = *program.function(callee)?;
                    if let Some(index) = f.builtin_index() {
                        self.call_builtin(callee, index)?;
                    } else {
                        next = self.enter(callee)?;
                    }
                }

                // ---- return ----
                Opcode::Done | Opcode::Return => {
                    let len = SLOT_SIZE.min(g.len() - a);
                    g.copy(a, OFS_RETURN, len);
                    let ret = self.leave()?;
                    if self.stack.depth() == entry_depth {
                        return Ok(());
                    }
                    next = ret + 1;
                }

                // ---- state ----
                Opcode::State => {
                    let frame = g.float(a);
                    let think = g.get(b);
                    self.run_state(frame, think)?;
                }
            }

            s = next;
        }
    }

    /// `STATE`: schedule the next think of `self` and set its frame.
    fn run_state(&mut self, frame: f32, think: Cell) -> Result<()> {
        let entity = self.self_entity();
        let system = *self.program.system_fields();
        let next = self.time() + self.config.state_interval;

        if let Some(field) = system.nextthink {
            self.entities.set_float(entity, u32::from(field), next)?;
        }
        if let Some(field) = system.frame {
            if self.entities.float(entity, u32::from(field))? != frame {
                self.entities.set_float(entity, u32::from(field), frame)?;
            }
        }
        if let Some(field) = system.think {
            self.entities.set(entity, u32::from(field), think)?;
        }
        Ok(())
    }

    fn call_builtin(&mut self, function: FunctionId, index: u32) -> Result<()> {
        let builtin = self.builtins.get(index)?;
        if let Some(entry) = self.profile.get_mut(function.index()) {
            entry.calls += 1;
        }
        if self.trace {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_builtin(index, builtin.name);
            }
        }
        (builtin.func)(self)
    }

    // =========================================================================
    // Enter / Leave
    // =========================================================================

    /// Enters a program function and returns its first statement.
    ///
    /// Checks every limit before touching any state, so a failed enter
    /// leaves both stacks as they were.
    fn enter(&mut self, function: FunctionId) -> Result<usize> {
        let f = *self.program.function(function)?;
        if self.stack.is_full() {
            return Err(Error::limit_exceeded(VmLimit::CallDepth {
                limit: self.stack.limit(),
            }));
        }

        let range = f.locals_range();
        self.locals.save(self.globals.slice(range))?;
        self.stack.push(Frame {
            return_statement: self.statement,
            function: self.function,
        })?;

        let mut dst = f.parm_start as usize;
        for (i, &size) in f.parm_size[..self.argc.min(f.num_parms as usize)]
            .iter()
            .enumerate()
        {
            let size = size as usize;
            self.globals.copy(ofs::parm(i), dst, size);
            dst += size;
        }

        self.function = function;
        self.profile[function.index()].calls += 1;
        trace!(
            function = self.program.function_name(function),
            depth = self.stack.depth(),
            "enter"
        );
        if self.trace {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_enter(function, self.stack.depth(), &self.program);
            }
        }
        Ok(f.first_statement as usize)
    }

    /// Leaves the executing function and returns the statement that called it.
    fn leave(&mut self) -> Result<usize> {
        if self.stack.is_empty() {
            return Err(Error::new(ErrorKind::StackUnderflow));
        }
        let leaving = self.function;
        let f = *self.program.function(leaving)?;
        self.locals.restore(self.globals.slice_mut(f.locals_range()))?;
        let frame = self.stack.pop()?;
        self.function = frame.function;
        self.statement = frame.return_statement;

        trace!(
            function = self.program.function_name(leaving),
            depth = self.stack.depth(),
            "leave"
        );
        if self.trace {
            if let Some(observer) = self.observer.as_mut() {
                observer.on_leave(leaving, self.stack.depth(), &self.program);
            }
        }
        Ok(frame.return_statement)
    }

    /// Leaves functions until the call stack is back at `depth`.
    fn unwind(&mut self, depth: usize) {
        while self.stack.depth() > depth {
            if self.leave().is_err() {
                break;
            }
        }
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Describes the active calls, innermost first.
    #[must_use]
    pub fn stack_trace(&self) -> Vec<String> {
        let mut trace = Vec::with_capacity(self.stack.depth() + 1);
        let mut function = self.function;
        let mut statement = self.statement;
        for frame in self.stack.frames().iter().rev() {
            trace.push(self.describe_frame(function, statement));
            function = frame.function;
            statement = frame.return_statement;
        }
        if !function.is_null() {
            trace.push(self.describe_frame(function, statement));
        }
        trace
    }

    fn describe_frame(&self, function: FunctionId, statement: usize) -> String {
        let file = self
            .program
            .function(function)
            .map(|f| self.strings.resolve(f.file))
            .unwrap_or("");
        let name = self.program.function_name(function);
        if file.is_empty() {
            format!("{name} statement {statement}")
        } else {
            format!("{name} ({file}) statement {statement}")
        }
    }

    /// Attaches where-it-happened context to a fresh error and logs it.
    ///
    /// Errors that already carry context came out of a nested execution and
    /// describe the innermost failure, so they pass through unchanged.
    fn decorate(&self, err: Error) -> Error {
        if err.context.is_some() {
            return err;
        }
        let function = self.program.function_name(self.function).to_string();
        let entity = self.self_entity();
        let mut context = ErrorContext::new()
            .with_function(function.clone())
            .with_statement(self.statement)
            .with_entity(entity);
        for frame in self.stack_trace() {
            context = context.with_frame(frame);
        }

        error!(
            function = %function,
            statement = self.statement,
            entity = entity.get(),
            depth = self.stack.depth(),
            "{}",
            err.kind
        );
        err.with_context(context)
    }
}

fn set_bool(value: bool, g: &mut GlobalSegment, ofs: usize) {
    g.set_float(ofs, if value { 1.0 } else { 0.0 });
}

fn field_offset(cell: Cell) -> u32 {
    cell.as_int() as u32
}

fn jump(s: usize, delta: i16) -> usize {
    s.wrapping_add_signed(isize::from(delta))
}

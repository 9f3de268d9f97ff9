//! A running program and the clock that drives it.
//!
//! The session owns the [`Vm`] and advances time frame by frame. Each frame
//! it runs the `think` function of every entity whose `nextthink` falls
//! inside the frame, binding `self` to that entity and `time` to the moment
//! the think was scheduled for.

use std::path::Path;
use std::sync::Arc;

use progsvm_debug::{Tracer, TracerConfig};
use progsvm_foundation::{EntityIndex, Result};
use progsvm_vm::{Builtins, Program, Vm, VmConfig};
use tracing::{debug, trace};

use crate::snapshot::{self, Snapshot};

/// A program instance plus its frame clock.
#[derive(Debug)]
pub struct Session {
    vm: Vm,
    time: f32,
    frame: u64,
}

impl Session {
    /// Creates a session over a program and builtin table.
    ///
    /// The clock starts at the program's initial `time` global. The VM is
    /// left inactive, so spawn functions may still write to the world.
    #[must_use]
    pub fn new(program: Arc<Program>, builtins: Arc<Builtins>, config: VmConfig) -> Self {
        let vm = Vm::new(program, builtins, config);
        let time = vm.time();
        Self { vm, time, frame: 0 }
    }

    /// Creates a session with the reference builtins registered.
    #[must_use]
    pub fn with_stdlib(program: Arc<Program>, config: VmConfig) -> Self {
        Self::new(program, Arc::new(progsvm_stdlib::builtins()), config)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the VM.
    #[must_use]
    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    /// Returns the VM mutably.
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Returns the session clock.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Sets the session clock and the program's `time` global.
    pub fn set_time(&mut self, time: f32) {
        self.time = time;
        self.vm.set_time(time);
    }

    /// Returns the number of frames run.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Ends the spawn phase. From now on the world entity is read-only.
    pub fn activate(&mut self) {
        self.vm.set_active(true);
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Runs a function by name with `self` and `other` bound to the world.
    ///
    /// # Errors
    ///
    /// Returns `UnknownFunction` or any execution error.
    pub fn call(&mut self, name: &str) -> Result<()> {
        self.vm.set_time(self.time);
        self.vm.set_self(EntityIndex::WORLD);
        self.vm.set_other(EntityIndex::WORLD);
        self.vm.execute_named(name)
    }

    /// Runs one entity's think function now.
    ///
    /// `nextthink` is cleared before the call so a think that does not
    /// reschedule itself runs once. `time` is set to the scheduled moment,
    /// or to the session clock if that is later. Returns whether the entity
    /// is still in use afterwards. A free entity, or a program without
    /// `think` and `nextthink` fields, runs nothing.
    ///
    /// # Errors
    ///
    /// Returns `NullFunction` if the entity has no think function, or any
    /// error raised while it runs.
    pub fn run_think(&mut self, entity: EntityIndex) -> Result<bool> {
        let system = *self.vm.program().system_fields();
        let (Some(think), Some(nextthink)) = (system.think, system.nextthink) else {
            return Ok(true);
        };
        if self.vm.entities().is_free(entity) {
            return Ok(false);
        }

        let entities = self.vm.entities();
        let scheduled = entities.float(entity, u32::from(nextthink))?;
        let function = entities.get(entity, u32::from(think))?.as_function();
        self.vm
            .entities_mut()
            .set_float(entity, u32::from(nextthink), 0.0)?;

        self.vm.set_time(scheduled.max(self.time));
        self.vm.set_self(entity);
        self.vm.set_other(EntityIndex::WORLD);
        trace!(entity = entity.get(), scheduled, "think");
        self.vm.execute(function)?;

        Ok(!self.vm.entities().is_free(entity))
    }

    /// Runs one frame of `frametime` seconds.
    ///
    /// Every entity in use when the frame starts whose `nextthink` is
    /// positive and no later than the end of the frame thinks once. An
    /// entity freed earlier in the frame is skipped; one spawned during the
    /// frame waits for the next. The clock then advances by `frametime`.
    /// Returns the number of thinks run.
    ///
    /// # Errors
    ///
    /// The first think error abandons the frame; the clock does not advance.
    pub fn run_frame(&mut self, frametime: f32) -> Result<usize> {
        let deadline = self.time + frametime;
        let mut ran = 0;

        if let Some(nextthink) = self.vm.program().system_fields().nextthink {
            let nextthink = u32::from(nextthink);
            let live: Vec<EntityIndex> = self.vm.entities().iter().collect();
            for entity in live {
                if self.vm.entities().is_free(entity) {
                    continue;
                }
                let scheduled = self.vm.entities().float(entity, nextthink)?;
                if scheduled <= 0.0 || scheduled > deadline {
                    continue;
                }
                self.run_think(entity)?;
                ran += 1;
            }
        }

        self.frame += 1;
        self.set_time(deadline);
        debug!(frame = self.frame, time = deadline, thinks = ran, "frame");
        Ok(ran)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Captures the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.vm, self.time, self.frame)
    }

    /// Replaces the current state with a snapshot's.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the snapshot was taken from a
    /// program with a different global segment or record layout. The
    /// session is unchanged in that case.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let Snapshot {
            time,
            frame,
            globals,
            entities,
            strings,
        } = snapshot;
        self.vm.restore_state(globals, entities, strings)?;
        self.time = time;
        self.frame = frame;
        debug!(frame, time, "restored snapshot");
        Ok(())
    }

    /// Saves the current state to a file.
    ///
    /// # Errors
    ///
    /// Returns `IoError` or `SerializationError`.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        snapshot::save_to_file(&self.snapshot(), path)
    }

    /// Restores state from a file written by [`save_to_file`](Self::save_to_file).
    ///
    /// # Errors
    ///
    /// Returns `IoError`, `SerializationError`, or whatever
    /// [`restore`](Self::restore) returns.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let snapshot = snapshot::load_from_file(path)?;
        self.restore(snapshot)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Installs a tracer and switches VM tracing on.
    pub fn enable_tracing(&mut self, config: TracerConfig) {
        self.vm.set_observer(Box::new(Tracer::new(config)));
        self.vm.set_trace(true);
    }

    /// Switches tracing off. The tracer stays installed so its records can
    /// still be read.
    pub fn disable_tracing(&mut self) {
        self.vm.set_trace(false);
    }

    /// Returns the installed tracer.
    #[must_use]
    pub fn tracer(&self) -> Option<&Tracer> {
        self.vm.observer::<Tracer>()
    }

    /// Lists the `count` busiest functions.
    #[must_use]
    pub fn profile_report(&self, count: usize) -> String {
        progsvm_debug::report(self.vm.program(), self.vm.profile(), count)
    }

    /// Lists an entity's non-zero fields.
    ///
    /// # Errors
    ///
    /// Returns `BadEntity` for an index outside the table.
    pub fn dump_entity(&self, entity: EntityIndex) -> Result<String> {
        progsvm_debug::format_entity(
            self.vm.program(),
            self.vm.strings(),
            self.vm.entities(),
            entity,
        )
    }

    /// Lists every entity in use.
    #[must_use]
    pub fn dump_entities(&self) -> String {
        progsvm_debug::format_entities(self.vm.program(), self.vm.strings(), self.vm.entities())
    }
}

// =============================================================================
// Tests
// =============================================================================

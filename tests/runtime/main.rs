//! Integration tests for Layer 4: Runtime
//!
//! Tests for sessions driving a small program through spawn, thinks, and
//! snapshots, with the reference builtins registered.

mod frames;
mod snapshots;

use std::sync::Arc;

use progsvm_foundation::ofs::{OFS_PARM0, OFS_RETURN};
use progsvm_foundation::{DefType, EntityIndex, FunctionId};
use progsvm_runtime::Session;
use progsvm_stdlib::number;
use progsvm_vm::{Opcode, ProgramBuilder, VmConfig};

/// Handles into the blinker program.
pub struct Blinker {
    pub session: Session,
    pub count: usize,
    pub frame: u32,
    pub think: u32,
    pub nextthink: u32,
    pub classname: u32,
    pub blink_on: FunctionId,
    pub blink_off: FunctionId,
}

/// `worldspawn` spawns a "blinker" whose two think functions alternate its
/// frame through `STATE` every quarter second. `crash` raises an error.
pub fn blinker() -> Blinker {
    let mut b = ProgramBuilder::new();
    b.global("self", DefType::Entity);
    b.global("other", DefType::Entity);
    b.global("world", DefType::Entity);
    let time = b.global("time", DefType::Float);
    let count = b.global("count", DefType::Float);
    let one = b.constant_float(1.0);
    let zero = b.constant_float(0.0);
    let quarter = b.constant_float(0.25);
    let blinker_s = b.constant_string("blinker");
    let message = b.constant_string("lamp broke");

    let classname = b.field("classname", DefType::String);
    let frame = b.field("frame", DefType::Float);
    let think = b.field("think", DefType::Function);
    let nextthink = b.field("nextthink", DefType::Float);

    let spawn = b.builtin("spawn", number::SPAWN);
    let spawn_g = b.function_global(spawn);
    let error = b.builtin("error", number::ERROR);
    let error_g = b.function_global(error);

    let blink_on = b.declare_function("blink_on");
    let blink_off = b.declare_function("blink_off");
    let on_g = b.function_global(blink_on);
    let off_g = b.function_global(blink_off);

    b.begin_function(blink_on, &[]);
    b.emit(Opcode::State, one, off_g, 0);
    b.emit(Opcode::AddF, count, one, count);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    b.begin_function(blink_off, &[]);
    b.emit(Opcode::State, zero, on_g, 0);
    b.emit(Opcode::AddF, count, one, count);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let _ = b.function("worldspawn", &[]);
    let e = b.local(DefType::Entity);
    let ptr = b.local(DefType::Pointer);
    let when = b.local(DefType::Float);
    b.emit(Opcode::Call0, spawn_g, 0, 0);
    b.emit(Opcode::StoreEnt, OFS_RETURN as u16, e, 0);
    b.emit(Opcode::Address, e, classname.global, ptr);
    b.emit(Opcode::StorePS, blinker_s, ptr, 0);
    b.emit(Opcode::Address, e, think.global, ptr);
    b.emit(Opcode::StorePFnc, on_g, ptr, 0);
    b.emit(Opcode::AddF, time, quarter, when);
    b.emit(Opcode::Address, e, nextthink.global, ptr);
    b.emit(Opcode::StorePF, when, ptr, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let _ = b.function("crash", &[]);
    b.emit(Opcode::StoreS, message, OFS_PARM0 as u16, 0);
    b.emit(Opcode::Call1, error_g, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let session = Session::with_stdlib(
        Arc::new(b.build().unwrap()),
        VmConfig::default().with_state_interval(0.25),
    );
    Blinker {
        session,
        count: usize::from(count),
        frame: u32::from(frame.field),
        think: u32::from(think.field),
        nextthink: u32::from(nextthink.field),
        classname: u32::from(classname.field),
        blink_on,
        blink_off,
    }
}

impl Blinker {
    /// Runs `worldspawn` and ends the spawn phase.
    pub fn start(&mut self) -> EntityIndex {
        self.session.call("worldspawn").unwrap();
        self.session.activate();
        EntityIndex::new(1)
    }

    pub fn count(&self) -> f32 {
        self.session.vm().globals().float(self.count)
    }

    pub fn float(&self, e: EntityIndex, field: u32) -> f32 {
        self.session.vm().entities().float(e, field).unwrap()
    }

    pub fn think_of(&self, e: EntityIndex) -> FunctionId {
        self.session
            .vm()
            .entities()
            .get(e, self.think)
            .unwrap()
            .as_function()
    }
}

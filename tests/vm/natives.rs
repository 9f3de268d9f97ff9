//! Integration tests for the native call boundary

use progsvm_foundation::{DefType, EntityIndex, Error, ErrorKind, Result};
use progsvm_vm::{Builtins, Opcode, ProgramBuilder, Vm, VmConfig};

use crate::{PARM0, PARM1, RETURN, build, vm_with};

// =============================================================================
// Builtins
// =============================================================================

fn seven(vm: &mut Vm) -> Result<()> {
    vm.return_float(7.0);
    Ok(())
}

fn count_args(vm: &mut Vm) -> Result<()> {
    let argc = vm.argc();
    vm.return_float(argc as f32);
    Ok(())
}

fn describe(vm: &mut Vm) -> Result<()> {
    let [x, y, z] = vm.get_vector(0);
    let text = format!("{} at {x} {y} {z}", vm.get_string(1));
    vm.return_string(&text);
    Ok(())
}

fn spawn(vm: &mut Vm) -> Result<()> {
    let e = vm.allocate_entity()?;
    vm.return_entity(e);
    Ok(())
}

fn apply(vm: &mut Vm) -> Result<()> {
    let f = vm.get_function(0);
    let x = vm.get_float(1);
    vm.globals_mut().set_float(progsvm_foundation::ofs::OFS_PARM0, x);
    vm.execute(f)
}

fn refuse(vm: &mut Vm) -> Result<()> {
    Err(Error::builtin(format!("refused with {} args", vm.argc())))
}

fn builtins() -> Builtins {
    Builtins::new()
        .with(1, "seven", seven)
        .with(2, "count_args", count_args)
        .with(3, "describe", describe)
        .with(4, "spawn", spawn)
        .with(5, "apply", apply)
        .with(6, "refuse", refuse)
}

fn run(b: ProgramBuilder) -> Vm {
    let (program, main) = build(b, "main");
    let mut vm = vm_with(program, builtins(), VmConfig::default());
    vm.execute(main).unwrap();
    vm
}

// =============================================================================
// Return Values
// =============================================================================

#[test]
fn native_return_reaches_next_reader() {
    let mut b = ProgramBuilder::new();
    let out = b.global("out", DefType::Float);
    let one = b.constant_float(1.0);
    let seven_f = b.builtin("seven", 1);
    let seven_g = b.function_global(seven_f);
    let _ = b.function("main", &[]);
    b.emit(Opcode::Call0, seven_g, 0, 0);
    b.emit(Opcode::AddF, RETURN, one, out);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let vm = run(b);
    assert_eq!(vm.globals().float(out as usize), 8.0);
}

#[test]
fn native_sees_call_argument_count() {
    let mut b = ProgramBuilder::new();
    let out = b.global("out", DefType::Float);
    let count_f = b.builtin("count_args", 2);
    let count_g = b.function_global(count_f);
    let _ = b.function("main", &[]);
    b.emit(Opcode::Call3, count_g, 0, 0);
    b.emit(Opcode::StoreF, RETURN, out, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let vm = run(b);
    assert_eq!(vm.globals().float(out as usize), 3.0);
}

#[test]
fn native_reads_vector_and_string_parameters() {
    let mut b = ProgramBuilder::new();
    let out = b.global("out", DefType::String);
    let origin = b.constant_vector([1.0, 2.5, -3.0]);
    let name = b.constant_string("door");
    let describe_f = b.builtin("describe", 3);
    let describe_g = b.function_global(describe_f);
    let _ = b.function("main", &[]);
    b.emit(Opcode::StoreV, origin, PARM0, 0);
    b.emit(Opcode::StoreS, name, PARM1, 0);
    b.emit(Opcode::Call2, describe_g, 0, 0);
    b.emit(Opcode::StoreS, RETURN, out, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let vm = run(b);
    let id = vm.globals().string(out as usize);
    assert_eq!(vm.string(id), "door at 1 2.5 -3");
}

// =============================================================================
// Entities Across the Boundary
// =============================================================================

#[test]
fn program_writes_to_natively_spawned_entity() {
    let mut b = ProgramBuilder::new();
    let health = b.field("health", DefType::Float);
    let hundred = b.constant_float(100.0);
    let spawn_f = b.builtin("spawn", 4);
    let spawn_g = b.function_global(spawn_f);
    let _ = b.function("main", &[]);
    let e = b.local(DefType::Entity);
    let ptr = b.local(DefType::Pointer);
    b.emit(Opcode::Call0, spawn_g, 0, 0);
    b.emit(Opcode::StoreEnt, RETURN, e, 0);
    b.emit(Opcode::Address, e, health.global, ptr);
    b.emit(Opcode::StorePF, hundred, ptr, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let vm = run(b);
    let spawned = EntityIndex::new(1);
    assert!(!vm.entities().is_free(spawned));
    assert_eq!(
        vm.entities().float(spawned, u32::from(health.field)).unwrap(),
        100.0
    );
}

// =============================================================================
// Re-entry and Errors
// =============================================================================

#[test]
fn native_can_call_back_into_program() {
    let mut b = ProgramBuilder::new();
    let out = b.global("out", DefType::Float);
    let five = b.constant_float(5.0);
    let apply_f = b.builtin("apply", 5);
    let apply_g = b.function_global(apply_f);

    let (double, parms) = b.function("double", &[DefType::Float]);
    let t = b.local(DefType::Float);
    b.emit(Opcode::AddF, parms[0], parms[0], t);
    b.emit(Opcode::Return, t, 0, 0);
    b.end_function();
    let double_g = b.function_global(double);

    let _ = b.function("main", &[]);
    b.emit(Opcode::StoreFnc, double_g, PARM0, 0);
    b.emit(Opcode::StoreF, five, PARM1, 0);
    b.emit(Opcode::Call2, apply_g, 0, 0);
    b.emit(Opcode::StoreF, RETURN, out, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let vm = run(b);
    assert_eq!(vm.globals().float(out as usize), 10.0);
    assert_eq!(vm.depth(), 0);
}

#[test]
fn native_error_aborts_whole_call() {
    let mut b = ProgramBuilder::new();
    let out = b.global("out", DefType::Float);
    let one = b.constant_float(1.0);
    let refuse_f = b.builtin("refuse", 6);
    let refuse_g = b.function_global(refuse_f);

    let (inner, _) = b.function("inner", &[]);
    b.emit(Opcode::Call2, refuse_g, 0, 0);
    b.emit(Opcode::StoreF, one, out, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    let inner_g = b.function_global(inner);

    let _ = b.function("main", &[]);
    b.emit(Opcode::Call0, inner_g, 0, 0);
    b.emit(Opcode::StoreF, one, out, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();

    let (program, main) = build(b, "main");
    let mut vm = vm_with(program, builtins(), VmConfig::default());
    let err = vm.execute(main).unwrap_err();

    assert!(matches!(&err.kind, ErrorKind::Builtin(m) if m == "refused with 2 args"));
    let context = err.context.unwrap();
    assert_eq!(context.function.as_deref(), Some("inner"));
    assert_eq!(context.stack.len(), 2);
    assert_eq!(vm.globals().float(out as usize), 0.0);
    assert_eq!(vm.depth(), 0);
}

//! Integration tests for calls, recursion, and the runaway budget

use progsvm_foundation::ofs::{OFS_PARM0, OFS_RETURN};
use progsvm_foundation::{DefType, ErrorKind, FunctionId, VmLimit};
use progsvm_vm::program::delta;
use progsvm_vm::{Builtins, Opcode, ProgramBuilder, Vm, VmConfig};
use proptest::prelude::*;

use crate::{PARM0, RETURN, build, vm, vm_with};

// =============================================================================
// Programs
// =============================================================================

/// `fib(n) = n < 2 ? n : fib(n - 1) + fib(n - 2)`
fn fibonacci(b: &mut ProgramBuilder) -> FunctionId {
    let one = b.constant_float(1.0);
    let two = b.constant_float(2.0);
    let fib = b.declare_function("fib");
    let fib_g = b.function_global(fib);

    let n = b.begin_function(fib, &[DefType::Float])[0];
    let cond = b.local(DefType::Float);
    let t = b.local(DefType::Float);
    let acc = b.local(DefType::Float);
    b.emit(Opcode::Lt, n, two, cond);
    let branch = b.emit(Opcode::IfNot, cond, 0, 0);
    b.emit(Opcode::Return, n, 0, 0);
    let recurse = b.here();
    b.patch_jump(branch, recurse);
    b.emit(Opcode::SubF, n, one, t);
    b.emit(Opcode::StoreF, t, PARM0, 0);
    b.emit(Opcode::Call1, fib_g, 0, 0);
    b.emit(Opcode::StoreF, RETURN, acc, 0);
    b.emit(Opcode::SubF, n, two, t);
    b.emit(Opcode::StoreF, t, PARM0, 0);
    b.emit(Opcode::Call1, fib_g, 0, 0);
    b.emit(Opcode::AddF, acc, RETURN, acc);
    b.emit(Opcode::Return, acc, 0, 0);
    b.end_function();
    fib
}

/// `even(n) = n == 0 || odd(n - 1)`, `odd(n) = n != 0 && even(n - 1)`.
fn parity(b: &mut ProgramBuilder) -> (FunctionId, FunctionId) {
    let zero = b.constant_float(0.0);
    let one = b.constant_float(1.0);
    let even = b.declare_function("even");
    let odd = b.declare_function("odd");
    let even_g = b.function_global(even);
    let odd_g = b.function_global(odd);

    for (f, base, other_g) in [(even, one, odd_g), (odd, zero, even_g)] {
        let n = b.begin_function(f, &[DefType::Float])[0];
        let cond = b.local(DefType::Float);
        let t = b.local(DefType::Float);
        b.emit(Opcode::EqF, n, zero, cond);
        let branch = b.emit(Opcode::IfNot, cond, 0, 0);
        b.emit(Opcode::Return, base, 0, 0);
        let recurse = b.here();
        b.patch_jump(branch, recurse);
        b.emit(Opcode::SubF, n, one, t);
        b.emit(Opcode::StoreF, t, PARM0, 0);
        b.emit(Opcode::Call1, other_g, 0, 0);
        b.emit(Opcode::Return, RETURN, 0, 0);
        b.end_function();
    }
    (even, odd)
}

fn call(vm: &mut Vm, f: FunctionId, n: f32) -> progsvm_foundation::Result<f32> {
    vm.globals_mut().set_float(OFS_PARM0, n);
    vm.execute(f)?;
    Ok(vm.globals().float(OFS_RETURN))
}

fn fib_host(n: u32) -> f32 {
    let (mut a, mut b) = (0.0f32, 1.0f32);
    for _ in 0..n {
        (a, b) = (b, a + b);
    }
    a
}

// =============================================================================
// Recursion
// =============================================================================

#[test]
fn mutual_recursion() {
    let mut b = ProgramBuilder::new();
    let (even, odd) = parity(&mut b);
    let mut vm = vm(b.build().unwrap());

    assert_eq!(call(&mut vm, even, 10.0).unwrap(), 1.0);
    assert_eq!(call(&mut vm, even, 7.0).unwrap(), 0.0);
    assert_eq!(call(&mut vm, odd, 7.0).unwrap(), 1.0);
    assert_eq!(vm.depth(), 0);
    assert_eq!(vm.locals_depth(), 0);
}

#[test]
fn mutual_recursion_overflows_past_depth_limit() {
    let mut b = ProgramBuilder::new();
    let (even, _) = parity(&mut b);
    let config = VmConfig::default().with_max_call_depth(8);
    let mut vm = vm_with(b.build().unwrap(), Builtins::new(), config);

    assert_eq!(call(&mut vm, even, 7.0).unwrap(), 0.0);
    let err = call(&mut vm, even, 8.0).unwrap_err();
    assert!(err.is_limit(|l| *l == VmLimit::CallDepth { limit: 8 }));
    assert_eq!(vm.depth(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn fibonacci_matches_host(n in 0u32..15) {
        let mut b = ProgramBuilder::new();
        let fib = fibonacci(&mut b);
        let mut vm = vm(b.build().unwrap());
        prop_assert_eq!(call(&mut vm, fib, n as f32).unwrap(), fib_host(n));
        prop_assert_eq!(vm.locals_depth(), 0);
    }
}

// =============================================================================
// Failure and Recovery
// =============================================================================

#[test]
fn vm_is_reusable_after_fatal_error() {
    let mut b = ProgramBuilder::new();
    let fib = fibonacci(&mut b);
    let nothing = b.global("nothing", DefType::Function);
    let fib_g = b.function_global(fib);
    let _ = b.function("broken", &[]);
    b.emit(Opcode::Call1, fib_g, 0, 0);
    b.emit(Opcode::Call0, nothing, 0, 0);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    let (program, broken) = build(b, "broken");
    let mut vm = vm(program);

    vm.globals_mut().set_float(OFS_PARM0, 6.0);
    let err = vm.execute(broken).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NullFunction));
    assert_eq!(err.context.unwrap().function.as_deref(), Some("broken"));
    assert_eq!(vm.depth(), 0);

    assert_eq!(call(&mut vm, fib, 10.0).unwrap(), 55.0);
}

#[test]
fn runaway_budget_covers_nested_calls() {
    let mut b = ProgramBuilder::new();
    let (helper, _) = b.function("helper", &[]);
    b.emit(Opcode::Return, RETURN, 0, 0);
    b.end_function();
    let helper_g = b.function_global(helper);

    let _ = b.function("spin", &[]);
    b.emit(Opcode::Call0, helper_g, 0, 0);
    b.emit(Opcode::Goto, delta(-1), 0, 0);
    b.end_function();
    let (program, spin) = build(b, "spin");
    let config = VmConfig::default().with_runaway_limit(500);
    let mut vm = vm_with(program, Builtins::new(), config);

    let err = vm.execute(spin).unwrap_err();
    assert!(err.is_limit(|l| *l == VmLimit::Runaway { limit: 500 }));
    let profile = vm.profile();
    assert!(profile[helper.index()].calls > 100);
    assert_eq!(profile[spin.index()].statements + profile[helper.index()].statements, 500);
    assert_eq!(vm.depth(), 0);
}

#[test]
fn each_top_level_call_gets_a_fresh_budget() {
    let mut b = ProgramBuilder::new();
    let fib = fibonacci(&mut b);
    let config = VmConfig::default().with_runaway_limit(2_000);
    let mut vm = vm_with(b.build().unwrap(), Builtins::new(), config);

    for _ in 0..10 {
        assert_eq!(call(&mut vm, fib, 10.0).unwrap(), 55.0);
    }
}

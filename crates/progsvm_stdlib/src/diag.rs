//! Diagnostic builtins: fatal errors, debug printing, entity dumps, and the
//! trace switches.

#![allow(clippy::unnecessary_wraps)]

use progsvm_debug::{format_entities, format_entity};
use progsvm_foundation::{EntityIndex, Error, Result};
use progsvm_vm::Vm;

use crate::var_string;

/// Prints an entity dump to the VM output.
fn dump(vm: &mut Vm, entity: EntityIndex) {
    let text = format_entity(vm.program(), vm.strings(), vm.entities(), entity);
    match text {
        Ok(text) => vm.print(text),
        Err(err) => vm.print(format!("{entity}: {err}\n")),
    }
}

/// `error(s, ...)`: reports a fatal error from the calling function.
///
/// Prints the message and the `self` entity, then aborts execution.
///
/// # Errors
///
/// Always returns a `Builtin` error carrying the message.
pub fn native_error(vm: &mut Vm) -> Result<()> {
    let message = var_string(vm, 0);
    let function = vm.program().function_name(vm.current_function()).to_string();
    vm.print(format!("error in {function}: {message}\n"));
    let entity = vm.self_entity();
    dump(vm, entity);
    Err(Error::builtin(message))
}

/// `objerror(s, ...)`: like `error`, but also removes `self`.
///
/// # Errors
///
/// Always returns a `Builtin` error carrying the message, unless removing
/// `self` fails first.
pub fn native_objerror(vm: &mut Vm) -> Result<()> {
    let message = var_string(vm, 0);
    let function = vm.program().function_name(vm.current_function()).to_string();
    vm.print(format!("object error in {function}: {message}\n"));
    let entity = vm.self_entity();
    dump(vm, entity);
    if !entity.is_world() {
        vm.free_entity(entity)?;
    }
    Err(Error::builtin(message))
}

/// `dprint(s, ...)`: developer output.
///
/// Emitted as a debug-level log event rather than VM output.
///
/// # Errors
///
/// Never fails.
pub fn native_dprint(vm: &mut Vm) -> Result<()> {
    let message = var_string(vm, 0);
    tracing::debug!(target: "progsvm::print", "{}", message.trim_end());
    Ok(())
}

/// `eprint(e)`: prints an entity's fields.
///
/// # Errors
///
/// Never fails.
pub fn native_eprint(vm: &mut Vm) -> Result<()> {
    let entity = vm.get_entity(0);
    dump(vm, entity);
    Ok(())
}

/// `coredump()`: prints every entity in use.
///
/// # Errors
///
/// Never fails.
pub fn native_coredump(vm: &mut Vm) -> Result<()> {
    let text = format_entities(vm.program(), vm.strings(), vm.entities());
    vm.print(text);
    Ok(())
}

/// `traceon()`: starts reporting statements to the VM's observer.
///
/// # Errors
///
/// Never fails.
pub fn native_traceon(vm: &mut Vm) -> Result<()> {
    vm.set_trace(true);
    Ok(())
}

/// `traceoff()`
///
/// # Errors
///
/// Never fails.
pub fn native_traceoff(vm: &mut Vm) -> Result<()> {
    vm.set_trace(false);
    Ok(())
}

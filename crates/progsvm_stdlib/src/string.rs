//! Number and vector formatting builtins.
//!
//! Results go to the VM's temporary string slots, so formatting every frame
//! does not grow the string pool.

#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use progsvm_foundation::{Result, Vec3};
use progsvm_vm::Vm;

/// Formats a float: whole numbers without a fraction, others with one
/// decimal in a five-wide field.
#[must_use]
pub fn format_float(f: f32) -> String {
    let whole = f as i32;
    if whole as f32 == f {
        format!("{whole}")
    } else {
        format!("{f:5.1}")
    }
}

/// Formats a vector as `'x y z'` with one decimal per component.
#[must_use]
pub fn format_vector(v: Vec3) -> String {
    format!("'{:5.1} {:5.1} {:5.1}'", v[0], v[1], v[2])
}

/// `ftos(f)`
///
/// # Errors
///
/// Never fails.
pub fn native_ftos(vm: &mut Vm) -> Result<()> {
    let s = format_float(vm.get_float(0));
    vm.return_string(&s);
    Ok(())
}

/// `vtos(v)`
///
/// # Errors
///
/// Never fails.
pub fn native_vtos(vm: &mut Vm) -> Result<()> {
    let s = format_vector(vm.get_vector(0));
    vm.return_string(&s);
    Ok(())
}

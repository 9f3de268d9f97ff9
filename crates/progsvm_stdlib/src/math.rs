//! Math builtins.

#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use progsvm_foundation::{Result, Vec3};
use progsvm_vm::Vm;
use rand::Rng;

/// Length of a vector, computed in double precision.
#[must_use]
pub fn vector_length(v: Vec3) -> f32 {
    let [x, y, z] = v.map(f64::from);
    (x * x + y * y + z * z).sqrt() as f32
}

/// Unit vector in the direction of `v`; the zero vector stays zero.
#[must_use]
pub fn normalize(v: Vec3) -> Vec3 {
    let [x, y, z] = v.map(f64::from);
    let len = (x * x + y * y + z * z).sqrt();
    if len == 0.0 {
        return [0.0; 3];
    }
    [(x / len) as f32, (y / len) as f32, (z / len) as f32]
}

/// Yaw angle of `v` in whole degrees, `0..360`.
#[must_use]
pub fn yaw(v: Vec3) -> f32 {
    if v[0] == 0.0 && v[1] == 0.0 {
        return 0.0;
    }
    let mut yaw = (f64::from(v[1]).atan2(f64::from(v[0])) * 180.0 / std::f64::consts::PI) as i32;
    if yaw < 0 {
        yaw += 360;
    }
    yaw as f32
}

/// Rounds half away from zero.
#[must_use]
pub fn rint(f: f32) -> f32 {
    if f > 0.0 {
        (f + 0.5) as i32 as f32
    } else {
        (f - 0.5) as i32 as f32
    }
}

/// `random()`: uniform in `[0, 1)` from the VM's seeded generator.
///
/// # Errors
///
/// Never fails.
pub fn native_random(vm: &mut Vm) -> Result<()> {
    let r: f32 = vm.rng_mut().gen_range(0.0..1.0);
    vm.return_float(r);
    Ok(())
}

/// `normalize(v)`
///
/// # Errors
///
/// Never fails.
pub fn native_normalize(vm: &mut Vm) -> Result<()> {
    let v = normalize(vm.get_vector(0));
    vm.return_vector(v);
    Ok(())
}

/// `vlen(v)`
///
/// # Errors
///
/// Never fails.
pub fn native_vlen(vm: &mut Vm) -> Result<()> {
    let len = vector_length(vm.get_vector(0));
    vm.return_float(len);
    Ok(())
}

/// `vectoyaw(v)`
///
/// # Errors
///
/// Never fails.
pub fn native_vectoyaw(vm: &mut Vm) -> Result<()> {
    let y = yaw(vm.get_vector(0));
    vm.return_float(y);
    Ok(())
}

/// `rint(f)`
///
/// # Errors
///
/// Never fails.
pub fn native_rint(vm: &mut Vm) -> Result<()> {
    let f = rint(vm.get_float(0));
    vm.return_float(f);
    Ok(())
}

/// `floor(f)`
///
/// # Errors
///
/// Never fails.
pub fn native_floor(vm: &mut Vm) -> Result<()> {
    let f = vm.get_float(0).floor();
    vm.return_float(f);
    Ok(())
}

/// `ceil(f)`
///
/// # Errors
///
/// Never fails.
pub fn native_ceil(vm: &mut Vm) -> Result<()> {
    let f = vm.get_float(0).ceil();
    vm.return_float(f);
    Ok(())
}

/// `fabs(f)`
///
/// # Errors
///
/// Never fails.
pub fn native_fabs(vm: &mut Vm) -> Result<()> {
    let f = vm.get_float(0).abs();
    vm.return_float(f);
    Ok(())
}

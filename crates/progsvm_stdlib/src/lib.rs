//! Reference builtin functions for progsvm programs.
//!
//! Builtins are organized by category:
//! - [`math`] - random numbers, rounding, vector length and direction
//! - [`string`] - number and vector formatting
//! - [`entity`] - spawning, removing, and walking entities
//! - [`diag`] - errors, debug printing, and trace switches
//!
//! Each builtin is registered at the number the classic game code declares
//! it with (`float() random = #7;`), so programs compiled against that
//! code call the right function.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod diag;
pub mod entity;
pub mod math;
pub mod string;


use progsvm_vm::{BuiltinFn, Builtins, Vm};

/// Builtin numbers.
pub mod number {
    /// `float() random`
    pub const RANDOM: u32 = 7;
    /// `vector(vector v) normalize`
    pub const NORMALIZE: u32 = 9;
    /// `void(string e, ...) error`
    pub const ERROR: u32 = 10;
    /// `void(string e, ...) objerror`
    pub const OBJERROR: u32 = 11;
    /// `float(vector v) vlen`
    pub const VLEN: u32 = 12;
    /// `float(vector v) vectoyaw`
    pub const VECTOYAW: u32 = 13;
    /// `entity() spawn`
    pub const SPAWN: u32 = 14;
    /// `void(entity e) remove`
    pub const REMOVE: u32 = 15;
    /// `entity(entity start, .string fld, string match) find`
    pub const FIND: u32 = 18;
    /// `void(string s, ...) dprint`
    pub const DPRINT: u32 = 25;
    /// `string(float f) ftos`
    pub const FTOS: u32 = 26;
    /// `string(vector v) vtos`
    pub const VTOS: u32 = 27;
    /// `void() coredump`
    pub const COREDUMP: u32 = 28;
    /// `void() traceon`
    pub const TRACEON: u32 = 29;
    /// `void() traceoff`
    pub const TRACEOFF: u32 = 30;
    /// `void(entity e) eprint`
    pub const EPRINT: u32 = 31;
    /// `float(float v) rint`
    pub const RINT: u32 = 36;
    /// `float(float v) floor`
    pub const FLOOR: u32 = 37;
    /// `float(float v) ceil`
    pub const CEIL: u32 = 38;
    /// `float(float f) fabs`
    pub const FABS: u32 = 43;
    /// `entity(entity e) nextent`
    pub const NEXTENT: u32 = 47;
}

/// Every builtin this crate provides: number, name, function.
pub const TABLE: [(u32, &str, BuiltinFn); 21] = [
    (number::RANDOM, "random", math::native_random),
    (number::NORMALIZE, "normalize", math::native_normalize),
    (number::ERROR, "error", diag::native_error),
    (number::OBJERROR, "objerror", diag::native_objerror),
    (number::VLEN, "vlen", math::native_vlen),
    (number::VECTOYAW, "vectoyaw", math::native_vectoyaw),
    (number::SPAWN, "spawn", entity::native_spawn),
    (number::REMOVE, "remove", entity::native_remove),
    (number::FIND, "find", entity::native_find),
    (number::DPRINT, "dprint", diag::native_dprint),
    (number::FTOS, "ftos", string::native_ftos),
    (number::VTOS, "vtos", string::native_vtos),
    (number::COREDUMP, "coredump", diag::native_coredump),
    (number::TRACEON, "traceon", diag::native_traceon),
    (number::TRACEOFF, "traceoff", diag::native_traceoff),
    (number::EPRINT, "eprint", diag::native_eprint),
    (number::RINT, "rint", math::native_rint),
    (number::FLOOR, "floor", math::native_floor),
    (number::CEIL, "ceil", math::native_ceil),
    (number::FABS, "fabs", math::native_fabs),
    (number::NEXTENT, "nextent", entity::native_nextent),
];

/// Registers every builtin into an existing table.
///
/// Numbers already taken are overwritten.
pub fn register(builtins: &mut Builtins) {
    for (index, name, func) in TABLE {
        builtins.register(index, name, func);
    }
}

/// Returns a table holding just these builtins.
#[must_use]
pub fn builtins() -> Builtins {
    let mut table = Builtins::new();
    register(&mut table);
    table
}

/// Concatenates the string arguments from `first` up to the argument count.
pub(crate) fn var_string(vm: &Vm, first: usize) -> String {
    (first..vm.argc()).map(|n| vm.get_string(n)).collect()
}

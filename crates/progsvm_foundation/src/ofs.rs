//! Well-known global segment offsets.
//!
//! The return slot and the eight parameter slots sit at fixed offsets at the
//! bottom of every global segment. Each slot is three cells wide so that a
//! vector fits; scalar values use only the first cell.

/// Offset 0 is never written and always reads as zero.
pub const OFS_NULL: usize = 0;
/// Return value slot (3 cells).
pub const OFS_RETURN: usize = 1;
/// First parameter slot (3 cells).
pub const OFS_PARM0: usize = 4;
/// Second parameter slot.
pub const OFS_PARM1: usize = 7;
/// Third parameter slot.
pub const OFS_PARM2: usize = 10;
/// Fourth parameter slot.
pub const OFS_PARM3: usize = 13;
/// Fifth parameter slot.
pub const OFS_PARM4: usize = 16;
/// Sixth parameter slot.
pub const OFS_PARM5: usize = 19;
/// Seventh parameter slot.
pub const OFS_PARM6: usize = 22;
/// Eighth parameter slot.
pub const OFS_PARM7: usize = 25;
/// First offset available to program-defined globals.
pub const RESERVED_OFS: usize = 28;

/// Maximum number of parameters a call can pass.
pub const MAX_PARMS: usize = 8;

/// Width of every parameter and return slot, in cells.
pub const SLOT_SIZE: usize = 3;

/// Returns the offset of parameter slot `n`.
///
/// # Panics
///
/// Panics if `n >= MAX_PARMS`.
#[must_use]
pub const fn parm(n: usize) -> usize {
    assert!(n < MAX_PARMS, "parameter slot out of range");
    OFS_PARM0 + n * SLOT_SIZE
}

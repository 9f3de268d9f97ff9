//! Integration tests for value cells
//!
//! Tests the reinterpretation views and the truth test.

use progsvm_foundation::ofs::{MAX_PARMS, OFS_PARM0, OFS_RETURN, RESERVED_OFS, SLOT_SIZE, parm};
use progsvm_foundation::{Cell, EntityIndex, FunctionId, StringId};

// =============================================================================
// Reinterpretation
// =============================================================================

#[test]
fn float_view_round_trips_bits() {
    for value in [0.0f32, 1.5, -2.25, f32::MAX, f32::MIN_POSITIVE] {
        assert_eq!(Cell::from_float(value).as_float().to_bits(), value.to_bits());
    }
}

#[test]
fn views_share_the_same_bits() {
    let cell = Cell::from_float(1.0);
    assert_eq!(cell.bits(), 0x3f80_0000);
    assert_eq!(cell.as_int(), 0x3f80_0000);
    assert_eq!(Cell::from_int(7).as_entity(), EntityIndex::new(7));
    assert_eq!(Cell::from_entity(EntityIndex::new(3)).as_function().index(), 3);
    assert_eq!(Cell::from_string(StringId::NULL), Cell::ZERO);
}

#[test]
fn from_conversions() {
    assert_eq!(Cell::from(2.5f32), Cell::from_float(2.5));
    assert_eq!(Cell::from(-1i32), Cell::from_int(-1));
}

// =============================================================================
// Truth
// =============================================================================

#[test]
fn only_all_zero_bits_are_false() {
    assert!(Cell::ZERO.is_zero());
    assert!(Cell::from_float(0.0).is_zero());
    assert!(!Cell::from_float(-0.0).is_zero());
    assert!(!Cell::from_float(f32::MIN_POSITIVE).is_zero());
}

#[test]
fn null_identifiers() {
    assert!(FunctionId::NULL.is_null());
    assert!(EntityIndex::WORLD.is_world());
    assert!(!EntityIndex::new(1).is_world());
}

// =============================================================================
// Fixed Offsets
// =============================================================================

#[test]
fn parameter_slots_follow_return_slot() {
    assert_eq!(OFS_PARM0, OFS_RETURN + SLOT_SIZE);
    for n in 1..MAX_PARMS {
        assert_eq!(parm(n), parm(n - 1) + SLOT_SIZE);
    }
    assert_eq!(parm(MAX_PARMS - 1) + SLOT_SIZE, RESERVED_OFS);
}

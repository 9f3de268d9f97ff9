//! Integration tests for the entity table
//!
//! Tests allocation with reuse hysteresis, freeing, and field access.

use progsvm_foundation::{Cell, EntityIndex, ErrorKind, FieldAddress, VmLimit};
use progsvm_storage::{
    EntityConfig, EntityTable, FieldLayout, NoSpatialIndex, SpatialIndex, SystemFields,
};

// =============================================================================
// Helpers
// =============================================================================

const MODEL: u16 = 0;
const FRAME: u16 = 1;
const NEXTTHINK: u16 = 2;
const ORIGIN: u16 = 3;
const HEALTH: u32 = 6;

fn layout() -> FieldLayout {
    let system = SystemFields::resolve(|name| match name {
        "model" => Some(MODEL),
        "frame" => Some(FRAME),
        "nextthink" => Some(NEXTTHINK),
        "origin" => Some(ORIGIN),
        _ => None,
    });
    FieldLayout::new(8).with_system(system)
}

fn table(config: EntityConfig) -> EntityTable {
    EntityTable::new(layout(), config)
}

#[derive(Default)]
struct Recorder {
    unlinked: Vec<EntityIndex>,
}

impl SpatialIndex for Recorder {
    fn unlink(&mut self, entity: EntityIndex) {
        self.unlinked.push(entity);
    }
}

// =============================================================================
// Allocation
// =============================================================================

#[test]
fn world_is_reserved_and_live() {
    let t = table(EntityConfig::new().with_capacity(4));
    assert_eq!(t.len(), 1);
    assert_eq!(t.live_count(), 1);
    assert!(!t.is_free(EntityIndex::WORLD));
}

#[test]
fn allocation_skips_reserved_prefix() {
    let mut t = table(EntityConfig::new().with_capacity(8).with_reserved(3));
    assert_eq!(t.allocate(0.0).unwrap(), EntityIndex::new(3));
}

#[test]
fn recently_freed_record_is_not_reused() {
    let mut t = table(EntityConfig::new().with_capacity(8));
    let a = t.allocate(1.0).unwrap();
    t.free(a, 1.0, &mut NoSpatialIndex).unwrap();
    let b = t.allocate(1.0).unwrap();
    assert_ne!(a, b);
}

#[test]
fn record_is_reused_after_hysteresis() {
    let mut t = table(EntityConfig::new().with_capacity(8).with_free_hysteresis(0.5));
    let a = t.allocate(1.0).unwrap();
    t.free(a, 1.0, &mut NoSpatialIndex).unwrap();
    assert_eq!(t.allocate(1.5).unwrap(), a);
}

#[test]
fn full_table_reuses_only_candidate() {
    let mut t = table(EntityConfig::new().with_capacity(3));
    let a = t.allocate(1.0).unwrap();
    let _b = t.allocate(1.0).unwrap();
    t.free(a, 1.0, &mut NoSpatialIndex).unwrap();
    assert_eq!(t.allocate(1.0).unwrap(), a);
}

#[test]
fn startup_grace_allows_immediate_reuse() {
    let mut t = table(EntityConfig::new().with_capacity(8).with_startup_grace(2.0));
    let a = t.allocate(0.0).unwrap();
    t.free(a, 0.5, &mut NoSpatialIndex).unwrap();
    assert_eq!(t.allocate(0.5).unwrap(), a);
}

#[test]
fn exhausted_table_is_fatal() {
    let mut t = table(EntityConfig::new().with_capacity(2));
    t.allocate(0.0).unwrap();
    let err = t.allocate(0.0).unwrap_err();
    assert!(err.is_limit(|l| *l == VmLimit::Edicts { limit: 2 }));
}

#[test]
fn allocation_clears_previous_contents() {
    let mut t = table(EntityConfig::new().with_capacity(2).with_free_hysteresis(0.0));
    let a = t.allocate(0.0).unwrap();
    t.set_float(a, HEALTH, 50.0).unwrap();
    t.free(a, 0.0, &mut NoSpatialIndex).unwrap();
    let b = t.allocate(0.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(t.float(b, HEALTH).unwrap(), 0.0);
}

// =============================================================================
// Freeing
// =============================================================================

#[test]
fn free_clears_engine_fields_and_unlinks() {
    let mut t = table(EntityConfig::new().with_capacity(4));
    let e = t.allocate(0.0).unwrap();
    t.set(e, u32::from(MODEL), Cell::from_int(12)).unwrap();
    t.set_float(e, u32::from(FRAME), 3.0).unwrap();
    t.set_vector(e, u32::from(ORIGIN), [1.0, 2.0, 3.0]).unwrap();
    t.set_float(e, HEALTH, 75.0).unwrap();
    t.set_linked(e, true).unwrap();

    let mut spatial = Recorder::default();
    t.free(e, 2.0, &mut spatial).unwrap();

    assert_eq!(spatial.unlinked, vec![e]);
    let state = t.state(e).unwrap();
    assert!(state.free);
    assert!(!state.linked);
    assert_eq!(state.free_time, 2.0);
    assert!(t.get(e, u32::from(MODEL)).unwrap().is_zero());
    assert_eq!(t.float(e, u32::from(FRAME)).unwrap(), 0.0);
    assert_eq!(t.vector(e, u32::from(ORIGIN)).unwrap(), [0.0; 3]);
    assert_eq!(t.float(e, u32::from(NEXTTHINK)).unwrap(), -1.0);
    assert_eq!(t.float(e, HEALTH).unwrap(), 75.0);
}

#[test]
fn reserved_and_missing_records_cannot_be_freed() {
    let mut t = table(EntityConfig::new().with_capacity(4));
    let err = t.free(EntityIndex::WORLD, 0.0, &mut NoSpatialIndex).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReservedEntity(_)));
    let err = t.free(EntityIndex::new(3), 0.0, &mut NoSpatialIndex).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BadEntity(3)));
}

// =============================================================================
// Field Access
// =============================================================================

#[test]
fn field_bounds_are_checked() {
    let mut t = table(EntityConfig::new().with_capacity(4));
    let e = t.allocate(0.0).unwrap();
    assert!(matches!(
        t.get(e, 8).unwrap_err().kind,
        ErrorKind::BadField(8)
    ));
    assert!(matches!(
        t.vector(e, 6).unwrap_err().kind,
        ErrorKind::BadField(6)
    ));
    assert!(matches!(
        t.get(EntityIndex::new(2), 0).unwrap_err().kind,
        ErrorKind::BadEntity(2)
    ));
}

#[test]
fn fat_addresses_reach_the_same_cells() {
    let mut t = table(EntityConfig::new().with_capacity(4));
    let e = t.allocate(0.0).unwrap();
    let addr = FieldAddress::encode(e, HEALTH).unwrap();
    t.write(addr, Cell::from_float(9.0)).unwrap();
    assert_eq!(t.float(e, HEALTH).unwrap(), 9.0);
    assert_eq!(t.read(addr).unwrap(), Cell::from_float(9.0));

    let origin = FieldAddress::encode(e, u32::from(ORIGIN)).unwrap();
    t.write3(origin, [Cell::from_float(4.0); 3]).unwrap();
    assert_eq!(t.vector(e, u32::from(ORIGIN)).unwrap(), [4.0; 3]);
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn iteration_skips_free_records() {
    let mut t = table(EntityConfig::new().with_capacity(8));
    let a = t.allocate(0.0).unwrap();
    let b = t.allocate(0.0).unwrap();
    let c = t.allocate(0.0).unwrap();
    t.free(b, 0.0, &mut NoSpatialIndex).unwrap();

    let live: Vec<EntityIndex> = t.iter().collect();
    assert_eq!(live, vec![EntityIndex::WORLD, a, c]);
    assert_eq!(t.next_live(a), Some(c));
    assert_eq!(t.next_live(c), None);
    assert_eq!(t.record(c).unwrap().len(), 8);
}

//! Integration tests for fat field addresses

use progsvm_foundation::{Cell, EntityIndex, FieldAddress};
use proptest::prelude::*;

#[test]
fn address_packs_entity_high() {
    let addr = FieldAddress::encode(EntityIndex::new(2), 5).unwrap();
    assert_eq!(addr.bits(), 0x0002_0005);
    assert_eq!(addr.entity(), EntityIndex::new(2));
    assert_eq!(addr.field(), 5);
}

#[test]
fn oversized_halves_do_not_encode() {
    assert!(FieldAddress::encode(EntityIndex::new(0x1_0000), 0).is_none());
    assert!(FieldAddress::encode(EntityIndex::new(1), 0x1_0000).is_none());
}

#[test]
fn address_survives_a_cell() {
    let addr = FieldAddress::encode(EntityIndex::new(600), 123).unwrap();
    let cell = Cell::from_int(addr.bits() as i32);
    assert_eq!(FieldAddress::from_bits(cell.bits()), addr);
}

proptest! {
    #[test]
    fn encode_decode_round_trip(
        entity in 0..=FieldAddress::MAX_ENTITY,
        field in 0..=FieldAddress::MAX_FIELD,
    ) {
        let addr = FieldAddress::encode(EntityIndex::new(entity), field).unwrap();
        prop_assert_eq!(addr.decode(), (EntityIndex::new(entity), field));
    }
}

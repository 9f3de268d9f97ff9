//! Integration tests for the global segment

use progsvm_foundation::{Cell, EntityIndex, FunctionId};
use progsvm_storage::GlobalSegment;

#[test]
fn new_segment_is_zeroed() {
    let g = GlobalSegment::new(16);
    assert_eq!(g.len(), 16);
    assert!(g.cells().iter().all(|c| c.is_zero()));
}

#[test]
fn typed_views_share_cells() {
    let mut g = GlobalSegment::new(8);
    g.set_float(0, 2.5);
    g.set_entity(1, EntityIndex::new(4));
    g.set(2, Cell::from_function(FunctionId(9)));
    g.set_int(3, -7);

    assert_eq!(g.float(0), 2.5);
    assert_eq!(g.entity(1), EntityIndex::new(4));
    assert_eq!(g.function(2), FunctionId(9));
    assert_eq!(g.int(3), -7);
    assert_eq!(g.get(0), Cell::from_float(2.5));
}

#[test]
fn vectors_span_three_cells() {
    let mut g = GlobalSegment::new(8);
    g.set_vector(2, [1.0, -2.0, 0.5]);
    assert_eq!(g.vector(2), [1.0, -2.0, 0.5]);
    assert_eq!(g.float(3), -2.0);
}

#[test]
fn overlapping_copy_moves_forward() {
    let mut g = GlobalSegment::from_cells((0..6).map(Cell::from_int).collect());
    g.copy(0, 1, 3);
    let ints: Vec<i32> = g.cells().iter().map(|c| c.as_int()).collect();
    assert_eq!(ints, vec![0, 0, 1, 2, 4, 5]);
}

#[test]
fn out_of_range_try_get_is_none() {
    let g = GlobalSegment::new(4);
    assert!(g.try_get(3).is_some());
    assert!(g.try_get(4).is_none());
}

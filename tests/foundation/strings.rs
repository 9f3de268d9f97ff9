//! Integration tests for the string pool

use progsvm_foundation::{StringId, StringTable};

#[test]
fn null_id_is_empty_string() {
    let table = StringTable::new();
    assert_eq!(table.resolve(StringId::NULL), "");
    assert!(table.is_empty());
}

#[test]
fn interning_deduplicates() {
    let mut table = StringTable::new();
    let a = table.intern("player");
    let b = table.intern("player");
    let c = table.intern("monster");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(table.resolve(c), "monster");
    assert_eq!(table.lookup("player"), Some(a));
}

#[test]
fn interior_nul_truncates() {
    let mut table = StringTable::new();
    let id = table.intern("door\0secret");
    assert_eq!(table.resolve(id), "door");
}

#[test]
fn unresolvable_ids_read_empty() {
    let table = StringTable::new();
    assert_eq!(table.get(StringId::NULL), Some(""));
    assert_eq!(table.resolve(StringId::new(9999)), "");
}

#[test]
fn blob_loads_every_string() {
    let table = StringTable::from_blob("\0light\0info_player_start\0");
    let light = table.lookup("light").unwrap();
    assert_eq!(table.resolve(light), "light");
    assert!(table.lookup("info_player_start").is_some());
}

#[test]
fn mid_string_offsets_resolve_to_suffix() {
    let mut table = StringTable::new();
    let id = table.intern("trigger_once");
    let suffix = StringId::new(id.offset() + 8);
    assert_eq!(table.resolve(suffix), "once");
}

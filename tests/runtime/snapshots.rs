//! Integration tests for saving and restoring sessions

use progsvm_foundation::EntityIndex;
use progsvm_runtime::{from_bytes, to_bytes};

use crate::{Blinker, blinker};

fn records(w: &Blinker) -> Vec<Vec<u32>> {
    let entities = w.session.vm().entities();
    (0..entities.len())
        .map(|i| {
            entities
                .record(EntityIndex::new(i as u32))
                .unwrap()
                .iter()
                .map(|c| c.bits())
                .collect()
        })
        .collect()
}

#[test]
fn restored_session_continues_identically() {
    let mut w = blinker();
    w.start();
    for _ in 0..3 {
        w.session.run_frame(0.25).unwrap();
    }
    let saved = to_bytes(&w.session.snapshot()).unwrap();

    for _ in 0..3 {
        w.session.run_frame(0.25).unwrap();
    }
    let globals = w.session.vm().globals().clone();
    let entities = records(&w);
    let time = w.session.time();

    w.session.restore(from_bytes(&saved).unwrap()).unwrap();
    assert_eq!(w.count(), 3.0);
    for _ in 0..3 {
        w.session.run_frame(0.25).unwrap();
    }
    assert_eq!(w.session.vm().globals(), &globals);
    assert_eq!(records(&w), entities);
    assert_eq!(w.session.time(), time);
}

#[test]
fn snapshot_file_restores_into_fresh_session() {
    let mut w = blinker();
    let e = w.start();
    w.session.run_frame(0.25).unwrap();
    let path = std::env::temp_dir().join("progsvm_runtime_blinker.msgpack");
    w.session.save_to_file(&path).unwrap();

    let mut fresh = blinker();
    fresh.session.load_from_file(&path).unwrap();
    assert_eq!(fresh.count(), 1.0);
    assert_eq!(fresh.float(e, fresh.frame), 1.0);
    assert_eq!(fresh.session.frame_count(), 1);

    let vm = fresh.session.vm();
    let name = vm.entities().get(e, fresh.classname).unwrap().as_string();
    assert_eq!(vm.string(name), "blinker");

    let _ = std::fs::remove_file(&path);
}

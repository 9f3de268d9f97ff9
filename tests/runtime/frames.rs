//! Integration tests for spawning and think scheduling

use progsvm_foundation::ErrorKind;

use crate::blinker;

#[test]
fn worldspawn_schedules_first_think() {
    let mut w = blinker();
    let e = w.start();

    let vm = w.session.vm();
    let name = vm.entities().get(e, w.classname).unwrap().as_string();
    assert_eq!(vm.string(name), "blinker");
    assert_eq!(w.float(e, w.nextthink), 0.25);
    assert_eq!(w.think_of(e), w.blink_on);
    assert!(vm.is_active());
}

#[test]
fn state_alternates_frames_each_interval() {
    let mut w = blinker();
    let e = w.start();

    assert_eq!(w.session.run_frame(0.25).unwrap(), 1);
    assert_eq!(w.float(e, w.frame), 1.0);
    assert_eq!(w.think_of(e), w.blink_off);
    assert_eq!(w.float(e, w.nextthink), 0.5);

    assert_eq!(w.session.run_frame(0.25).unwrap(), 1);
    assert_eq!(w.float(e, w.frame), 0.0);
    assert_eq!(w.think_of(e), w.blink_on);
    assert_eq!(w.float(e, w.nextthink), 0.75);
}

#[test]
fn long_frames_still_think_once() {
    let mut w = blinker();
    let e = w.start();

    for _ in 0..4 {
        assert_eq!(w.session.run_frame(1.0).unwrap(), 1);
    }
    assert_eq!(w.count(), 4.0);
    assert_eq!(w.session.time(), 4.0);
    assert_eq!(w.session.frame_count(), 4);
    assert_eq!(w.float(e, w.frame), 0.0);
}

#[test]
fn short_frames_wait_for_schedule() {
    let mut w = blinker();
    w.start();

    let thinks: usize = (0..8).map(|_| w.session.run_frame(0.125).unwrap()).sum();
    assert_eq!(thinks, 4);
    assert_eq!(w.count(), 4.0);
}

#[test]
fn builtin_error_surfaces_from_call() {
    let mut w = blinker();
    w.start();

    let err = w.session.call("crash").unwrap_err();
    assert!(matches!(&err.kind, ErrorKind::Builtin(m) if m == "lamp broke"));
    let output = w.session.vm().output().join("");
    assert!(output.contains("error in crash: lamp broke"));
    assert_eq!(w.session.vm().depth(), 0);

    assert_eq!(w.session.run_frame(0.25).unwrap(), 1);
}

#[test]
fn dumps_and_profile_describe_the_world() {
    let mut w = blinker();
    let e = w.start();
    w.session.run_frame(0.25).unwrap();

    let dump = w.session.dump_entity(e).unwrap();
    assert!(dump.contains("\"blinker\""), "{dump}");
    assert!(dump.contains("blink_off()"), "{dump}");
    assert!(w.session.profile_report(10).contains("worldspawn"));
}

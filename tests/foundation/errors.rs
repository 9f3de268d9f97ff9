//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use progsvm_foundation::{EntityIndex, Error, ErrorContext, ErrorKind, VmLimit};

// =============================================================================
// Error Display
// =============================================================================

#[test]
fn kinds_render_classic_messages() {
    let cases = [
        (ErrorKind::NullFunction, "NULL function"),
        (ErrorKind::BadBuiltin(99), "bad builtin call number 99"),
        (ErrorKind::AssignmentToWorld, "assignment to world entity"),
        (ErrorKind::BadEntity(7), "bad entity reference 7"),
        (
            ErrorKind::ReservedEntity(EntityIndex::WORLD),
            "edict 0 is reserved",
        ),
    ];
    for (kind, message) in cases {
        assert_eq!(Error::new(kind).to_string(), message);
    }
}

#[test]
fn limits_render_their_bound() {
    let err = Error::limit_exceeded(VmLimit::Runaway { limit: 100_000 });
    assert_eq!(err.to_string(), "limit exceeded: runaway loop (100000 instructions)");
    let err = Error::limit_exceeded(VmLimit::CallDepth { limit: 32 });
    assert!(err.to_string().contains("depth 32"));
}

#[test]
fn builtin_error_is_the_message() {
    let err = Error::builtin("bad thing");
    assert!(matches!(&err.kind, ErrorKind::Builtin(m) if m == "bad thing"));
    assert_eq!(err.to_string(), "bad thing");
}

#[test]
fn is_limit_matches_kind() {
    let err = Error::limit_exceeded(VmLimit::Edicts { limit: 600 });
    assert!(err.is_limit(|l| matches!(l, VmLimit::Edicts { .. })));
    assert!(!err.is_limit(|l| matches!(l, VmLimit::Runaway { .. })));
    assert!(!Error::invalid_program("x").is_limit(|_| true));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_lists_function_entity_and_stack() {
    let context = ErrorContext::new()
        .with_function("monster_think")
        .with_statement(42)
        .with_entity(EntityIndex::new(3))
        .with_frame("monster_think")
        .with_frame("main");
    let err = Error::new(ErrorKind::NullFunction).with_context(context);

    let text = err.context.as_ref().unwrap().to_string();
    assert!(text.starts_with("in monster_think at statement 42 (self = edict 3)"));
    assert!(text.contains("  in main\n"));
}

#[test]
fn empty_context_renders_nothing() {
    assert_eq!(ErrorContext::new().to_string(), "");
}

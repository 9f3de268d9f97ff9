//! Profile reports.
//!
//! The VM counts calls and executed statements per function. These helpers
//! rank functions by statements executed and render the top of the list.

use std::fmt::Write;

use progsvm_foundation::FunctionId;
use progsvm_vm::{FunctionProfile, Program};

/// One function's counters, named.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileEntry {
    /// The function.
    pub function: FunctionId,
    /// Its name.
    pub name: String,
    /// Times called.
    pub calls: u64,
    /// Statements executed inside it.
    pub statements: u64,
}

/// Returns up to `count` functions that did any work, busiest first.
///
/// Ties are broken by call count, then by function id.
#[must_use]
pub fn top_functions(program: &Program, profile: &[FunctionProfile], count: usize) -> Vec<ProfileEntry> {
    let mut entries: Vec<ProfileEntry> = profile
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, p)| p.calls > 0 || p.statements > 0)
        .map(|(i, p)| {
            let function = FunctionId(u32::try_from(i).unwrap_or(u32::MAX));
            ProfileEntry {
                function,
                name: program.function_name(function).to_string(),
                calls: p.calls,
                statements: p.statements,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.statements
            .cmp(&a.statements)
            .then(b.calls.cmp(&a.calls))
            .then(a.function.cmp(&b.function))
    });
    entries.truncate(count);
    entries
}

/// Renders the busiest `count` functions as a table.
#[must_use]
pub fn report(program: &Program, profile: &[FunctionProfile], count: usize) -> String {
    let total: u64 = profile.iter().map(|p| p.statements).sum();
    let mut out = format!("{:>10} {:>8}  function\n", "statements", "calls");
    for entry in top_functions(program, profile, count) {
        let _ = writeln!(out, "{:>10} {:>8}  {}", entry.statements, entry.calls, entry.name);
    }
    let _ = writeln!(out, "{total:>10} total");
    out
}

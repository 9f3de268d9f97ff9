//! Entity dumps.
//!
//! Lists an entity record by field name, showing only fields that are not
//! all-zero. Vector component definitions (`origin_x` and friends) are
//! skipped since the vector itself is listed.

use std::fmt::Write;

use progsvm_foundation::{EntityIndex, Result, StringTable};
use progsvm_storage::EntityTable;
use progsvm_vm::Program;

use crate::disasm::format_value;

fn is_component(name: &str) -> bool {
    name.len() > 2 && (name.ends_with("_x") || name.ends_with("_y") || name.ends_with("_z"))
}

/// Formats one entity record.
///
/// # Errors
///
/// Returns `BadEntity` if the record does not exist.
pub fn format_entity(
    program: &Program,
    strings: &StringTable,
    entities: &EntityTable,
    entity: EntityIndex,
) -> Result<String> {
    if entities.state(entity)?.free {
        return Ok(format!("{entity}: free\n"));
    }
    let record = entities.record(entity)?;
    let mut out = format!("{entity}:\n");

    for def in program.field_defs() {
        let name = program.def_name(def);
        if name.is_empty() || is_component(name) {
            continue;
        }
        let start = def.offset as usize;
        let Some(cells) = record.get(start..start + def.ty.size()) else {
            continue;
        };
        if cells.iter().all(|c| c.is_zero()) {
            continue;
        }
        let _ = writeln!(out, "{name:>15} {}", format_value(program, strings, def.ty, cells));
    }
    Ok(out)
}

/// Formats every record in use, followed by a count line.
#[must_use]
pub fn format_entities(program: &Program, strings: &StringTable, entities: &EntityTable) -> String {
    let mut out = String::new();
    for entity in entities.iter() {
        if let Ok(text) = format_entity(program, strings, entities, entity) {
            out.push_str(&text);
        }
    }
    let _ = writeln!(
        out,
        "{} in use, {} records, capacity {}",
        entities.live_count(),
        entities.len(),
        entities.capacity()
    );
    out
}

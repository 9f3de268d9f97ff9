//! Statement disassembly.
//!
//! Renders statements one per line: index, mnemonic, then operands. A
//! global operand prints as its definition name, or `#offset` when the
//! program has no definition there, followed by its current value in
//! parentheses when a global segment is supplied. The value is decoded by
//! the definition's type, or failing that by what the opcode does with the
//! operand. Destinations print without a value since they are about to be
//! overwritten.

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

use std::fmt::Write;

use progsvm_foundation::{Cell, DefType, FieldAddress, FunctionId, Result, StringTable};
use progsvm_storage::GlobalSegment;
use progsvm_vm::{Opcode, Operand, Program, Statement};

// =============================================================================
// Values
// =============================================================================

/// Formats the cells of one value as the given type.
///
/// `cells` must hold at least `ty.size()` cells; missing cells print as `?`.
#[must_use]
pub fn format_value(program: &Program, strings: &StringTable, ty: DefType, cells: &[Cell]) -> String {
    let Some(&first) = cells.first() else {
        return "?".to_string();
    };
    match ty {
        DefType::Void => "void".to_string(),
        DefType::String => format!("{:?}", strings.resolve(first.as_string())),
        DefType::Float => format!("{}", first.as_float()),
        DefType::Vector => match cells.get(..3) {
            Some(v) => format!(
                "'{} {} {}'",
                v[0].as_float(),
                v[1].as_float(),
                v[2].as_float()
            ),
            None => "?".to_string(),
        },
        DefType::Entity => first.as_entity().to_string(),
        DefType::Field => format_field(program, first.as_int()),
        DefType::Function => format!("{}()", program.function_name(first.as_function())),
        DefType::Pointer => {
            let (entity, field) = FieldAddress::from_bits(first.bits()).decode();
            format!("&{entity}{}", format_field(program, field as i32))
        }
    }
}

fn format_field(program: &Program, offset: i32) -> String {
    let def = u16::try_from(offset)
        .ok()
        .and_then(|ofs| program.field_defs().iter().find(|d| d.offset == ofs));
    match def {
        Some(def) => format!(".{}", program.def_name(def)),
        None => format!(".{offset}"),
    }
}

// =============================================================================
// Statements
// =============================================================================

/// What an opcode reads from or writes through an operand slot.
fn operand_type(op: Opcode, slot: usize, width: u8) -> DefType {
    use Opcode as O;
    match (op, slot) {
        (O::Call0 | O::Call1 | O::Call2 | O::Call3 | O::Call4, 0)
        | (O::Call5 | O::Call6 | O::Call7 | O::Call8, 0)
        | (O::State, 1)
        | (O::EqFnc | O::NeFnc | O::StoreFnc | O::StorePFnc, 0 | 1)
        | (O::NotFnc, 0)
        | (O::LoadFnc, 2) => DefType::Function,
        (O::EqS | O::NeS | O::StoreS, 0 | 1)
        | (O::StorePS | O::NotS, 0)
        | (O::LoadS, 2) => DefType::String,
        (O::EqE | O::NeE | O::StoreEnt, 0 | 1)
        | (O::StorePEnt | O::NotEnt, 0)
        | (O::LoadEnt, 2)
        | (
            O::LoadF | O::LoadV | O::LoadS | O::LoadEnt | O::LoadFld | O::LoadFnc | O::Address,
            0,
        ) => DefType::Entity,
        (O::LoadF | O::LoadV | O::LoadS | O::LoadEnt | O::LoadFld | O::LoadFnc | O::Address, 1)
        | (O::StoreFld, 0 | 1)
        | (O::StorePFld, 0)
        | (O::LoadFld, 2) => DefType::Field,
        (O::Address, 2)
        | (
            O::StorePF | O::StorePV | O::StorePS | O::StorePEnt | O::StorePFld | O::StorePFnc,
            1,
        ) => DefType::Pointer,
        _ if width == 3 => DefType::Vector,
        _ => DefType::Float,
    }
}

/// Operand slot an opcode writes to in the global segment, if any.
fn destination(op: Opcode) -> Option<usize> {
    use Opcode as O;
    match op {
        O::StoreF | O::StoreV | O::StoreS | O::StoreEnt | O::StoreFld | O::StoreFnc => Some(1),
        O::StorePF | O::StorePV | O::StorePS | O::StorePEnt | O::StorePFld | O::StorePFnc => None,
        O::Done | O::Return | O::If | O::IfNot | O::Goto | O::State => None,
        _ if op.call_argc().is_some() => None,
        _ => Some(2),
    }
}

fn format_global(
    program: &Program,
    strings: &StringTable,
    globals: Option<&GlobalSegment>,
    offset: u16,
    hint: DefType,
    with_value: bool,
) -> String {
    let def = program.global_at(offset);
    let mut text = match def {
        Some(def) => program.def_name(def).to_string(),
        None => format!("#{offset}"),
    };
    if let (true, Some(globals)) = (with_value, globals) {
        let ty = def.map_or(hint, |d| d.ty);
        let start = offset as usize;
        let end = (start + ty.size()).min(globals.len());
        let cells = if start < end {
            globals.slice(start..end)
        } else {
            &[]
        };
        let _ = write!(text, "({})", format_value(program, strings, ty, cells));
    }
    text
}

/// Formats one statement.
///
/// With `globals` the operands show their current values, which is what an
/// execution trace wants; without, only names, which suits a listing.
#[must_use]
pub fn format_statement(
    program: &Program,
    strings: &StringTable,
    globals: Option<&GlobalSegment>,
    index: usize,
    statement: &Statement,
) -> String {
    let Some(op) = statement.opcode() else {
        return format!("{index:>5}: ?{} {} {} {}", statement.op, statement.a, statement.b, statement.c);
    };

    let mut line = format!("{index:>5}: {:<12}", op.name());
    let raw = [statement.a, statement.b, statement.c];
    let dest = destination(op);
    let mut parts = Vec::with_capacity(3);

    for (slot, operand) in op.operands().into_iter().enumerate() {
        match operand {
            Operand::Unused => {}
            Operand::Delta => {
                let delta = raw[slot] as i16;
                let target = index as i64 + i64::from(delta);
                parts.push(format!("branch {delta:+} ({target})"));
            }
            Operand::Global(width) => {
                if raw[slot] == 0 && matches!(op, Opcode::Done | Opcode::Return) {
                    continue;
                }
                let hint = operand_type(op, slot, width);
                parts.push(format_global(
                    program,
                    strings,
                    globals,
                    raw[slot],
                    hint,
                    dest != Some(slot),
                ));
            }
        }
    }

    line.push_str(&parts.join(", "));
    line.trim_end().to_string()
}

/// Lists every statement of a function, with a header line.
///
/// A function's statements run from its first statement up to the next
/// function's first statement, or the end of the program.
///
/// # Errors
///
/// Returns `NullFunction` or `BadFunction` for ids outside the table.
pub fn disassemble_function(program: &Program, id: FunctionId) -> Result<String> {
    let f = program.function(id)?;
    let strings = program.strings();
    let name = program.function_name(id);

    if let Some(index) = f.builtin_index() {
        return Ok(format!("{name}: builtin #{index}\n"));
    }

    let start = f.first_statement as usize;
    let end = program
        .functions()
        .iter()
        .filter(|g| !g.is_builtin())
        .map(|g| g.first_statement as usize)
        .filter(|&s| s > start)
        .min()
        .unwrap_or(program.statements().len());

    let mut out = format!(
        "{name} ({}) parms {} locals {}\n",
        strings.resolve(f.file),
        f.num_parms,
        f.locals
    );
    for (i, st) in program.statements()[start..end].iter().enumerate() {
        let _ = writeln!(out, "{}", format_statement(program, strings, None, start + i, st));
    }
    Ok(out)
}

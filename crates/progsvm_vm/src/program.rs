//! The program image.
//!
//! A [`Program`] is everything the compiler produced, already parsed: the
//! statement stream, the function table, the initial global segment, the
//! string pool, and the global and field definitions used for lookups and
//! diagnostics. It is validated once on construction and immutable after.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;

use progsvm_foundation::ofs::{MAX_PARMS, RESERVED_OFS};
use progsvm_foundation::{Cell, DefType, Error, ErrorKind, FunctionId, Result, StringId, StringTable};
use progsvm_storage::{EntityTable, FieldLayout, GlobalSegment, SystemFields};

use crate::opcode::{Opcode, Operand};

// =============================================================================
// Statements, Functions, Definitions
// =============================================================================

/// One instruction: an opcode and three operands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statement {
    /// Raw opcode number; unknown numbers fail when executed.
    pub op: u16,
    /// First operand.
    pub a: u16,
    /// Second operand.
    pub b: u16,
    /// Third operand.
    pub c: u16,
}

impl Statement {
    /// Creates a statement from a decoded opcode.
    #[must_use]
    pub const fn new(op: Opcode, a: u16, b: u16, c: u16) -> Self {
        Self {
            op: op.to_u16(),
            a,
            b,
            c,
        }
    }

    /// Decodes the opcode.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u16(self.op)
    }

    /// Operand `a` read as a signed branch delta.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn delta_a(&self) -> i16 {
        self.a as i16
    }

    /// Operand `b` read as a signed branch delta.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn delta_b(&self) -> i16 {
        self.b as i16
    }
}

/// Encodes a signed branch delta as an operand.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn delta(offset: i16) -> u16 {
    offset as u16
}

/// A function descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Function {
    /// First statement; negative means builtin number `-first_statement`.
    pub first_statement: i32,
    /// Global offset of the first parameter.
    pub parm_start: u16,
    /// Cells from `parm_start` saved across calls (parameters included).
    pub locals: u16,
    /// Number of declared parameters.
    pub num_parms: u8,
    /// Width in cells of each parameter.
    pub parm_size: [u8; MAX_PARMS],
    /// Function name.
    pub name: StringId,
    /// Source file name.
    pub file: StringId,
}

impl Function {
    /// Returns true if this function is implemented by the host.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        self.first_statement < 0
    }

    /// Returns the builtin number for host functions.
    #[must_use]
    pub const fn builtin_index(&self) -> Option<u32> {
        if self.first_statement < 0 {
            Some(self.first_statement.unsigned_abs())
        } else {
            None
        }
    }

    /// Range of global cells saved and restored across calls.
    #[must_use]
    pub fn locals_range(&self) -> std::ops::Range<usize> {
        let start = self.parm_start as usize;
        start..start + self.locals as usize
    }
}

/// A named global or entity field definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Def {
    /// Declared type.
    pub ty: DefType,
    /// Global offset, or field offset for field definitions.
    pub offset: u16,
    /// Name.
    pub name: StringId,
    /// Whether the value belongs in saved games.
    pub save: bool,
}

/// Global offsets of the engine-known globals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemGlobals {
    /// `entity self` - the entity a function runs on behalf of.
    pub self_entity: Option<u16>,
    /// `entity other`.
    pub other: Option<u16>,
    /// `entity world`.
    pub world: Option<u16>,
    /// `float time` - the program clock.
    pub time: Option<u16>,
}

impl SystemGlobals {
    /// Resolves every system global through a name lookup.
    pub fn resolve(mut lookup: impl FnMut(&str) -> Option<u16>) -> Self {
        Self {
            self_entity: lookup("self"),
            other: lookup("other"),
            world: lookup("world"),
            time: lookup("time"),
        }
    }
}

// =============================================================================
// Program
// =============================================================================

/// Raw program contents, as a loader or builder produces them.
#[derive(Clone, Debug, Default)]
pub struct ProgramParts {
    /// Statement stream.
    pub statements: Vec<Statement>,
    /// Function table; entry 0 is the null function.
    pub functions: Vec<Function>,
    /// Initial global segment.
    pub globals: Vec<Cell>,
    /// String pool.
    pub strings: StringTable,
    /// Global definitions.
    pub global_defs: Vec<Def>,
    /// Entity field definitions.
    pub field_defs: Vec<Def>,
    /// Cells per entity record.
    pub entity_fields: usize,
}

/// A validated, immutable program image.
#[derive(Clone, Debug)]
pub struct Program {
    statements: Vec<Statement>,
    functions: Vec<Function>,
    globals: Vec<Cell>,
    strings: StringTable,
    global_defs: Vec<Def>,
    field_defs: Vec<Def>,
    entity_fields: usize,
    system_globals: SystemGlobals,
    system_fields: SystemFields,
    function_names: HashMap<String, FunctionId>,
    global_names: HashMap<String, usize>,
    field_names: HashMap<String, usize>,
    globals_by_offset: HashMap<u16, usize>,
}

impl Program {
    /// Validates raw parts and builds a program.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProgram` if any statement operand, function range, or
    /// definition points outside the global segment or statement stream.
    pub fn from_parts(parts: ProgramParts) -> Result<Self> {
        validate(&parts)?;

        let ProgramParts {
            statements,
            functions,
            globals,
            strings,
            global_defs,
            field_defs,
            entity_fields,
        } = parts;

        let mut function_names = HashMap::new();
        for (i, f) in functions.iter().enumerate().skip(1) {
            function_names
                .entry(strings.resolve(f.name).to_string())
                .or_insert(FunctionId(i as u32));
        }

        let mut global_names = HashMap::new();
        let mut globals_by_offset = HashMap::new();
        for (i, def) in global_defs.iter().enumerate() {
            global_names
                .entry(strings.resolve(def.name).to_string())
                .or_insert(i);
            globals_by_offset.entry(def.offset).or_insert(i);
        }

        let mut field_names = HashMap::new();
        for (i, def) in field_defs.iter().enumerate() {
            field_names
                .entry(strings.resolve(def.name).to_string())
                .or_insert(i);
        }

        let system_globals = SystemGlobals::resolve(|name| {
            global_names.get(name).map(|&i| global_defs[i].offset)
        });
        let system_fields =
            SystemFields::resolve(|name| field_names.get(name).map(|&i| field_defs[i].offset));

        Ok(Self {
            statements,
            functions,
            globals,
            strings,
            global_defs,
            field_defs,
            entity_fields,
            system_globals,
            system_fields,
            function_names,
            global_names,
            field_names,
            globals_by_offset,
        })
    }

    /// Returns the statement stream.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns a statement.
    #[must_use]
    pub fn statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    /// Returns the function table.
    #[must_use]
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Returns a function descriptor.
    ///
    /// # Errors
    ///
    /// Returns `NullFunction` for function 0 and `BadFunction` for ids
    /// outside the table.
    pub fn function(&self, id: FunctionId) -> Result<&Function> {
        if id.is_null() {
            return Err(Error::new(ErrorKind::NullFunction));
        }
        self.functions
            .get(id.index())
            .ok_or_else(|| Error::new(ErrorKind::BadFunction(id.0)))
    }

    /// Returns a function's name, or `"<null>"`/`"<invalid>"`.
    #[must_use]
    pub fn function_name(&self, id: FunctionId) -> &str {
        if id.is_null() {
            return "<null>";
        }
        match self.functions.get(id.index()) {
            Some(f) => self.strings.resolve(f.name),
            None => "<invalid>",
        }
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    /// Returns the initial global segment.
    #[must_use]
    pub fn globals(&self) -> &[Cell] {
        &self.globals
    }

    /// Returns the string pool.
    #[must_use]
    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Returns the global definitions.
    #[must_use]
    pub fn global_defs(&self) -> &[Def] {
        &self.global_defs
    }

    /// Returns the entity field definitions.
    #[must_use]
    pub fn field_defs(&self) -> &[Def] {
        &self.field_defs
    }

    /// Looks up a global definition by name.
    #[must_use]
    pub fn find_global(&self, name: &str) -> Option<&Def> {
        self.global_names.get(name).map(|&i| &self.global_defs[i])
    }

    /// Looks up an entity field definition by name.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&Def> {
        self.field_names.get(name).map(|&i| &self.field_defs[i])
    }

    /// Returns the global definition placed at an offset, if any.
    #[must_use]
    pub fn global_at(&self, offset: u16) -> Option<&Def> {
        self.globals_by_offset
            .get(&offset)
            .map(|&i| &self.global_defs[i])
    }

    /// Returns the name of a definition.
    #[must_use]
    pub fn def_name(&self, def: &Def) -> &str {
        self.strings.resolve(def.name)
    }

    /// Cells per entity record.
    #[must_use]
    pub fn entity_fields(&self) -> usize {
        self.entity_fields
    }

    /// Offsets of the engine-known globals.
    #[must_use]
    pub fn system_globals(&self) -> &SystemGlobals {
        &self.system_globals
    }

    /// Offsets of the engine-known entity fields.
    #[must_use]
    pub fn system_fields(&self) -> &SystemFields {
        &self.system_fields
    }

    /// The entity record layout this program expects.
    #[must_use]
    pub fn field_layout(&self) -> FieldLayout {
        FieldLayout::new(self.entity_fields).with_system(self.system_fields)
    }

    /// Checks that saved state was made by this program.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the global segment length or the
    /// entity record layout differs from this program's.
    pub fn check_state(&self, globals: &GlobalSegment, entities: &EntityTable) -> Result<()> {
        let expected = self.globals.len();
        if globals.len() != expected {
            return Err(Error::new(ErrorKind::SerializationError(format!(
                "saved state has {} globals, program has {expected}",
                globals.len()
            ))));
        }
        if *entities.layout() != self.field_layout() {
            return Err(Error::new(ErrorKind::SerializationError(format!(
                "saved records have {} fields, program has {}",
                entities.layout().field_count,
                self.entity_fields
            ))));
        }
        Ok(())
    }
}

// =============================================================================
// Validation
// =============================================================================

fn invalid(message: String) -> Error {
    Error::invalid_program(message)
}

fn validate(parts: &ProgramParts) -> Result<()> {
    let globals = parts.globals.len();
    if globals < RESERVED_OFS {
        return Err(invalid(format!(
            "global segment has {globals} cells, need at least {RESERVED_OFS}"
        )));
    }
    if parts.functions.is_empty() {
        return Err(invalid("function table has no null entry".to_string()));
    }

    for (i, st) in parts.statements.iter().enumerate() {
        let Some(op) = st.opcode() else {
            // Unknown opcodes are reported when executed.
            continue;
        };
        for (operand, value) in op.operands().into_iter().zip([st.a, st.b, st.c]) {
            let Operand::Global(width) = operand else {
                continue;
            };
            if value as usize + width as usize > globals {
                return Err(invalid(format!(
                    "statement {i} ({}) addresses global {value} outside segment of {globals}",
                    op.name()
                )));
            }
        }
    }

    for (i, f) in parts.functions.iter().enumerate().skip(1) {
        if !f.is_builtin() && f.first_statement as usize >= parts.statements.len() {
            return Err(invalid(format!(
                "function {i} starts at statement {} past end of {}",
                f.first_statement,
                parts.statements.len()
            )));
        }
        if f.locals_range().end > globals {
            return Err(invalid(format!(
                "function {i} locals {:?} outside segment of {globals}",
                f.locals_range()
            )));
        }
        if f.num_parms as usize > MAX_PARMS {
            return Err(invalid(format!(
                "function {i} declares {} parameters",
                f.num_parms
            )));
        }
        let parm_cells: usize = f.parm_size[..f.num_parms as usize]
            .iter()
            .map(|&s| s as usize)
            .sum();
        if f.parm_size.iter().any(|&s| s > 3) || (!f.is_builtin() && parm_cells > f.locals as usize) {
            return Err(invalid(format!("function {i} has malformed parameter sizes")));
        }
    }

    for def in &parts.global_defs {
        if def.offset as usize + def.ty.size() > globals {
            return Err(invalid(format!(
                "global definition at {} outside segment of {globals}",
                def.offset
            )));
        }
    }
    for def in &parts.field_defs {
        if def.offset as usize + def.ty.size() > parts.entity_fields {
            return Err(invalid(format!(
                "field definition at {} outside record of {}",
                def.offset, parts.entity_fields
            )));
        }
    }

    Ok(())
}

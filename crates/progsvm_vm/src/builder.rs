//! Assembles program images by hand.
//!
//! Loading a compiled image from disk is the host's business. The builder
//! exists for hosts that generate code directly and for tests: it lays out
//! globals, fields, and functions the way a compiler would and hands the
//! result to [`Program::from_parts`] for validation.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use progsvm_foundation::ofs::{MAX_PARMS, RESERVED_OFS};
use progsvm_foundation::{Cell, DefType, FunctionId, Result, StringTable, Vec3};

use crate::opcode::Opcode;
use crate::program::{Def, Function, Program, ProgramParts, Statement, delta};

/// An entity field as the builder laid it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRef {
    /// Offset of the field inside each entity record.
    pub field: u16,
    /// Global holding that offset, as `LOAD` and `ADDRESS` expect in operand `b`.
    pub global: u16,
}

/// Incrementally builds a [`Program`].
#[derive(Debug)]
pub struct ProgramBuilder {
    statements: Vec<Statement>,
    functions: Vec<Function>,
    globals: Vec<Cell>,
    strings: StringTable,
    global_defs: Vec<Def>,
    field_defs: Vec<Def>,
    entity_fields: usize,
    current: Option<usize>,
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramBuilder {
    /// Creates a builder holding the null statement, the null function, and
    /// the reserved return and parameter slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            statements: vec![Statement::new(Opcode::Done, 0, 0, 0)],
            functions: vec![Function::default()],
            globals: vec![Cell::ZERO; RESERVED_OFS],
            strings: StringTable::new(),
            global_defs: Vec::new(),
            field_defs: Vec::new(),
            entity_fields: 0,
            current: None,
        }
    }

    fn alloc(&mut self, size: usize) -> u16 {
        let ofs = self.globals.len() as u16;
        self.globals.resize(self.globals.len() + size, Cell::ZERO);
        ofs
    }

    // =========================================================================
    // Globals and Fields
    // =========================================================================

    /// Declares a named global and returns its offset.
    pub fn global(&mut self, name: &str, ty: DefType) -> u16 {
        let offset = self.alloc(ty.size());
        let name = self.strings.intern(name);
        self.global_defs.push(Def {
            ty,
            offset,
            name,
            save: true,
        });
        offset
    }

    /// Allocates an unnamed global.
    pub fn temp(&mut self, ty: DefType) -> u16 {
        self.alloc(ty.size())
    }

    /// Allocates an unnamed float constant.
    pub fn constant_float(&mut self, value: f32) -> u16 {
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = Cell::from_float(value);
        ofs
    }

    /// Allocates an unnamed vector constant.
    pub fn constant_vector(&mut self, value: Vec3) -> u16 {
        let ofs = self.alloc(3);
        for (i, v) in value.into_iter().enumerate() {
            self.globals[ofs as usize + i] = Cell::from_float(v);
        }
        ofs
    }

    /// Allocates an unnamed string constant.
    pub fn constant_string(&mut self, value: &str) -> u16 {
        let id = self.strings.intern(value);
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = Cell::from_string(id);
        ofs
    }

    /// Sets the initial value of a global cell.
    pub fn set_global(&mut self, ofs: u16, cell: Cell) {
        self.globals[ofs as usize] = cell;
    }

    /// Declares an entity field.
    ///
    /// The field gets a slot in every entity record, and a global of type
    /// `Field` is created holding the slot offset.
    pub fn field(&mut self, name: &str, ty: DefType) -> FieldRef {
        let field = self.entity_fields as u16;
        self.entity_fields += ty.size();

        let id = self.strings.intern(name);
        self.field_defs.push(Def {
            ty,
            offset: field,
            name: id,
            save: true,
        });

        let global = self.alloc(1);
        self.globals[global as usize] = Cell::from_int(i32::from(field));
        self.global_defs.push(Def {
            ty: DefType::Field,
            offset: global,
            name: id,
            save: false,
        });
        FieldRef { field, global }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Adds a function table entry to be defined later with
    /// [`begin_function`](Self::begin_function).
    pub fn declare_function(&mut self, name: &str) -> FunctionId {
        let name = self.strings.intern(name);
        let file = self.strings.intern("builder");
        self.functions.push(Function {
            name,
            file,
            ..Function::default()
        });
        FunctionId((self.functions.len() - 1) as u32)
    }

    /// Adds a host function with builtin number `index`.
    pub fn builtin(&mut self, name: &str, index: u32) -> FunctionId {
        let id = self.declare_function(name);
        self.functions[id.index()].first_statement = -(index as i32);
        id
    }

    /// Creates a global holding a function reference, for `CALL` operands.
    pub fn function_global(&mut self, id: FunctionId) -> u16 {
        let ofs = self.alloc(1);
        self.globals[ofs as usize] = Cell::from_function(id);
        ofs
    }

    /// Starts the body of a declared function and allocates its parameters.
    ///
    /// Returns the parameter offsets. Every global allocated until
    /// [`end_function`](Self::end_function) belongs to the function's
    /// saved local range.
    ///
    /// # Panics
    ///
    /// Panics if more than eight parameters are given.
    pub fn begin_function(&mut self, id: FunctionId, params: &[DefType]) -> Vec<u16> {
        assert!(params.len() <= MAX_PARMS, "too many parameters");
        let first_statement = self.statements.len() as i32;
        let parm_start = self.globals.len() as u16;

        let offsets: Vec<u16> = params.iter().map(|ty| self.alloc(ty.size())).collect();

        let f = &mut self.functions[id.index()];
        f.first_statement = first_statement;
        f.parm_start = parm_start;
        f.num_parms = params.len() as u8;
        f.parm_size = [0; MAX_PARMS];
        for (slot, ty) in f.parm_size.iter_mut().zip(params) {
            *slot = ty.size() as u8;
        }
        self.current = Some(id.index());
        offsets
    }

    /// Declares and starts a function in one step.
    pub fn function(&mut self, name: &str, params: &[DefType]) -> (FunctionId, Vec<u16>) {
        let id = self.declare_function(name);
        let offsets = self.begin_function(id, params);
        (id, offsets)
    }

    /// Allocates a local in the function being built.
    pub fn local(&mut self, ty: DefType) -> u16 {
        self.alloc(ty.size())
    }

    /// Finishes the function being built, fixing its local range.
    pub fn end_function(&mut self) {
        if let Some(index) = self.current.take() {
            let f = &mut self.functions[index];
            f.locals = (self.globals.len() - f.parm_start as usize) as u16;
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Appends a statement and returns its index.
    pub fn emit(&mut self, op: Opcode, a: u16, b: u16, c: u16) -> usize {
        self.statements.push(Statement::new(op, a, b, c));
        self.statements.len() - 1
    }

    /// Index the next emitted statement will get.
    #[must_use]
    pub fn here(&self) -> usize {
        self.statements.len()
    }

    /// Points the branch at `at` to statement `target`.
    ///
    /// `GOTO` keeps its delta in operand `a`; `IF` and `IFNOT` in `b`.
    pub fn patch_jump(&mut self, at: usize, target: usize) {
        let offset = delta(target as i16 - at as i16);
        let st = &mut self.statements[at];
        if st.op == Opcode::Goto.to_u16() {
            st.a = offset;
        } else {
            st.b = offset;
        }
    }

    /// Interns a string in the program's pool.
    pub fn intern(&mut self, s: &str) -> progsvm_foundation::StringId {
        self.strings.intern(s)
    }

    /// Validates and returns the program.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProgram` if the assembled image is inconsistent.
    pub fn build(mut self) -> Result<Program> {
        self.end_function();
        Program::from_parts(ProgramParts {
            statements: self.statements,
            functions: self.functions,
            globals: self.globals,
            strings: self.strings,
            global_defs: self.global_defs,
            field_defs: self.field_defs,
            entity_fields: self.entity_fields,
        })
    }
}

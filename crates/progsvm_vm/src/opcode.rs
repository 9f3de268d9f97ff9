//! Instruction set of the progs VM.
//!
//! Every statement names three operands. Most are global segment offsets;
//! the branch opcodes reuse one operand as a signed statement delta. The
//! numbering is fixed by the compiler that produced the program.

#![allow(clippy::doc_markdown)]

/// One opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    // === Control ===
    /// Return from the outermost function (same as `Return`).
    Done = 0,

    // === Arithmetic ===
    /// `c.f = a.f * b.f`
    MulF,
    /// `c.f = dot(a.v, b.v)`
    MulV,
    /// `c.v = a.f * b.v`
    MulFV,
    /// `c.v = a.v * b.f`
    MulVF,
    /// `c.f = a.f / b.f`
    DivF,
    /// `c.f = a.f + b.f`
    AddF,
    /// `c.v = a.v + b.v`
    AddV,
    /// `c.f = a.f - b.f`
    SubF,
    /// `c.v = a.v - b.v`
    SubV,

    // === Comparison ===
    /// `c.f = a.f == b.f`
    EqF,
    /// `c.f = a.v == b.v` (all components)
    EqV,
    /// `c.f = a.s == b.s` (by contents)
    EqS,
    /// `c.f = a.e == b.e`
    EqE,
    /// `c.f = a.fn == b.fn`
    EqFnc,
    /// `c.f = a.f != b.f`
    NeF,
    /// `c.f = a.v != b.v`
    NeV,
    /// `c.f = a.s != b.s`
    NeS,
    /// `c.f = a.e != b.e`
    NeE,
    /// `c.f = a.fn != b.fn`
    NeFnc,
    /// `c.f = a.f <= b.f`
    Le,
    /// `c.f = a.f >= b.f`
    Ge,
    /// `c.f = a.f < b.f`
    Lt,
    /// `c.f = a.f > b.f`
    Gt,

    // === Entity Field Loads ===
    /// `c = a.e.(b.field)`
    LoadF,
    /// `c.v = a.e.(b.field)` (3 cells)
    LoadV,
    /// String field load.
    LoadS,
    /// Entity field load.
    LoadEnt,
    /// Field-offset field load.
    LoadFld,
    /// Function field load.
    LoadFnc,
    /// `c = &a.e.(b.field)` as a fat address.
    Address,

    // === Global Stores ===
    /// `b = a`
    StoreF,
    /// `b.v = a.v` (3 cells)
    StoreV,
    /// String store.
    StoreS,
    /// Entity store.
    StoreEnt,
    /// Field-offset store.
    StoreFld,
    /// Function store.
    StoreFnc,

    // === Indirect Stores ===
    /// `*b = a`
    StorePF,
    /// `*b = a.v` (3 cells)
    StorePV,
    /// String indirect store.
    StorePS,
    /// Entity indirect store.
    StorePEnt,
    /// Field-offset indirect store.
    StorePFld,
    /// Function indirect store.
    StorePFnc,

    // === Control ===
    /// Copy `a` (3 cells) to the return slot and leave the function.
    Return,

    // === Logic ===
    /// `c.f = !a.f`
    NotF,
    /// `c.f = a.v == '0 0 0'`
    NotV,
    /// `c.f = a.s` is null or empty
    NotS,
    /// `c.f = a.e` is the world
    NotEnt,
    /// `c.f = a.fn` is null
    NotFnc,

    // === Branches ===
    /// Jump by `b` statements if `a` is nonzero.
    If,
    /// Jump by `b` statements if `a` is zero.
    IfNot,

    // === Calls ===
    /// Call `a` with 0 arguments.
    Call0,
    /// Call `a` with 1 argument.
    Call1,
    /// Call `a` with 2 arguments.
    Call2,
    /// Call `a` with 3 arguments.
    Call3,
    /// Call `a` with 4 arguments.
    Call4,
    /// Call `a` with 5 arguments.
    Call5,
    /// Call `a` with 6 arguments.
    Call6,
    /// Call `a` with 7 arguments.
    Call7,
    /// Call `a` with 8 arguments.
    Call8,

    // === Misc ===
    /// `self.frame = a; self.think = b; self.nextthink = time + interval`
    State,
    /// Jump by `a` statements.
    Goto,
    /// `c.f = a.f && b.f`
    And,
    /// `c.f = a.f || b.f`
    Or,
    /// `c.f = (int)a.f & (int)b.f`
    BitAnd,
    /// `c.f = (int)a.f | (int)b.f`
    BitOr,
}

/// What a statement operand means for a given opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Not read or written.
    Unused,
    /// A global segment offset spanning this many cells.
    Global(u8),
    /// A signed relative statement delta.
    Delta,
}

impl Opcode {
    /// Every opcode, in numeric order.
    pub const ALL: [Opcode; 66] = [
        Self::Done,
        Self::MulF,
        Self::MulV,
        Self::MulFV,
        Self::MulVF,
        Self::DivF,
        Self::AddF,
        Self::AddV,
        Self::SubF,
        Self::SubV,
        Self::EqF,
        Self::EqV,
        Self::EqS,
        Self::EqE,
        Self::EqFnc,
        Self::NeF,
        Self::NeV,
        Self::NeS,
        Self::NeE,
        Self::NeFnc,
        Self::Le,
        Self::Ge,
        Self::Lt,
        Self::Gt,
        Self::LoadF,
        Self::LoadV,
        Self::LoadS,
        Self::LoadEnt,
        Self::LoadFld,
        Self::LoadFnc,
        Self::Address,
        Self::StoreF,
        Self::StoreV,
        Self::StoreS,
        Self::StoreEnt,
        Self::StoreFld,
        Self::StoreFnc,
        Self::StorePF,
        Self::StorePV,
        Self::StorePS,
        Self::StorePEnt,
        Self::StorePFld,
        Self::StorePFnc,
        Self::Return,
        Self::NotF,
        Self::NotV,
        Self::NotS,
        Self::NotEnt,
        Self::NotFnc,
        Self::If,
        Self::IfNot,
        Self::Call0,
        Self::Call1,
        Self::Call2,
        Self::Call3,
        Self::Call4,
        Self::Call5,
        Self::Call6,
        Self::Call7,
        Self::Call8,
        Self::State,
        Self::Goto,
        Self::And,
        Self::Or,
        Self::BitAnd,
        Self::BitOr,
    ];

    /// Decodes a raw opcode number.
    #[must_use]
    pub fn from_u16(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Returns the raw opcode number.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Number of arguments passed by a `CALLn` opcode.
    #[must_use]
    pub const fn call_argc(self) -> Option<usize> {
        let raw = self as u16;
        if raw >= Self::Call0 as u16 && raw <= Self::Call8 as u16 {
            Some((raw - Self::Call0 as u16) as usize)
        } else {
            None
        }
    }

    /// Returns the `CALLn` opcode for `argc` arguments.
    #[must_use]
    pub fn call(argc: usize) -> Option<Self> {
        if argc > 8 {
            return None;
        }
        Self::from_u16(Self::Call0 as u16 + u16::try_from(argc).ok()?)
    }

    /// Upper-case mnemonic, as printed by disassemblers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::MulF => "MUL_F",
            Self::MulV => "MUL_V",
            Self::MulFV => "MUL_FV",
            Self::MulVF => "MUL_VF",
            Self::DivF => "DIV",
            Self::AddF => "ADD_F",
            Self::AddV => "ADD_V",
            Self::SubF => "SUB_F",
            Self::SubV => "SUB_V",
            Self::EqF => "EQ_F",
            Self::EqV => "EQ_V",
            Self::EqS => "EQ_S",
            Self::EqE => "EQ_E",
            Self::EqFnc => "EQ_FNC",
            Self::NeF => "NE_F",
            Self::NeV => "NE_V",
            Self::NeS => "NE_S",
            Self::NeE => "NE_E",
            Self::NeFnc => "NE_FNC",
            Self::Le => "LE",
            Self::Ge => "GE",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::LoadF => "INDIRECT",
            Self::LoadV => "INDIRECT_V",
            Self::LoadS => "INDIRECT_S",
            Self::LoadEnt => "INDIRECT_E",
            Self::LoadFld => "INDIRECT_FI",
            Self::LoadFnc => "INDIRECT_FU",
            Self::Address => "ADDRESS",
            Self::StoreF => "STORE_F",
            Self::StoreV => "STORE_V",
            Self::StoreS => "STORE_S",
            Self::StoreEnt => "STORE_ENT",
            Self::StoreFld => "STORE_FLD",
            Self::StoreFnc => "STORE_FNC",
            Self::StorePF => "STOREP_F",
            Self::StorePV => "STOREP_V",
            Self::StorePS => "STOREP_S",
            Self::StorePEnt => "STOREP_ENT",
            Self::StorePFld => "STOREP_FLD",
            Self::StorePFnc => "STOREP_FNC",
            Self::Return => "RETURN",
            Self::NotF => "NOT_F",
            Self::NotV => "NOT_V",
            Self::NotS => "NOT_S",
            Self::NotEnt => "NOT_ENT",
            Self::NotFnc => "NOT_FNC",
            Self::If => "IF",
            Self::IfNot => "IFNOT",
            Self::Call0 => "CALL0",
            Self::Call1 => "CALL1",
            Self::Call2 => "CALL2",
            Self::Call3 => "CALL3",
            Self::Call4 => "CALL4",
            Self::Call5 => "CALL5",
            Self::Call6 => "CALL6",
            Self::Call7 => "CALL7",
            Self::Call8 => "CALL8",
            Self::State => "STATE",
            Self::Goto => "GOTO",
            Self::And => "AND",
            Self::Or => "OR",
            Self::BitAnd => "BITAND",
            Self::BitOr => "BITOR",
        }
    }

    /// Describes operands `a`, `b`, and `c`.
    #[must_use]
    pub const fn operands(self) -> [Operand; 3] {
        use Operand::{Delta, Global, Unused};
        const S: Operand = Global(1);
        const V: Operand = Global(3);
        match self {
            Self::Done | Self::Return => [S, Unused, Unused],
            Self::MulF
            | Self::DivF
            | Self::AddF
            | Self::SubF
            | Self::EqF
            | Self::EqS
            | Self::EqE
            | Self::EqFnc
            | Self::NeF
            | Self::NeS
            | Self::NeE
            | Self::NeFnc
            | Self::Le
            | Self::Ge
            | Self::Lt
            | Self::Gt
            | Self::And
            | Self::Or
            | Self::BitAnd
            | Self::BitOr
            | Self::LoadF
            | Self::LoadS
            | Self::LoadEnt
            | Self::LoadFld
            | Self::LoadFnc
            | Self::Address => [S, S, S],
            Self::MulV | Self::EqV | Self::NeV => [V, V, S],
            Self::MulFV => [S, V, V],
            Self::MulVF => [V, S, V],
            Self::AddV | Self::SubV => [V, V, V],
            Self::LoadV => [S, S, V],
            Self::StoreF
            | Self::StoreS
            | Self::StoreEnt
            | Self::StoreFld
            | Self::StoreFnc
            | Self::StorePF
            | Self::StorePS
            | Self::StorePEnt
            | Self::StorePFld
            | Self::StorePFnc
            | Self::State => [S, S, Unused],
            Self::StoreV => [V, V, Unused],
            Self::StorePV => [V, S, Unused],
            Self::NotF | Self::NotS | Self::NotEnt | Self::NotFnc => [S, Unused, S],
            Self::NotV => [V, Unused, S],
            Self::If | Self::IfNot => [S, Delta, Unused],
            Self::Goto => [Delta, Unused, Unused],
            Self::Call0
            | Self::Call1
            | Self::Call2
            | Self::Call3
            | Self::Call4
            | Self::Call5
            | Self::Call6
            | Self::Call7
            | Self::Call8 => [S, Unused, Unused],
        }
    }
}

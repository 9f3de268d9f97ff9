//! The native call boundary.
//!
//! A builtin is a plain function pointer taking the whole VM. Arguments are
//! not marshalled: the builtin reads the fixed parameter slots and writes the
//! fixed return slot through the accessors below, and may call back into
//! [`Vm::execute`].

use progsvm_foundation::ofs::{self, OFS_RETURN};
use progsvm_foundation::{
    Cell, EntityIndex, Error, ErrorKind, FunctionId, Result, StringId, Vec3,
};

use super::Vm;

/// Signature of every builtin.
pub type BuiltinFn = fn(&mut Vm) -> Result<()>;

/// A registered builtin.
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    /// Name used in traces and diagnostics.
    pub name: &'static str,
    /// Implementation.
    pub func: BuiltinFn,
}

/// Builtin dispatch table, indexed by builtin number.
///
/// Built once by the host and shared with every VM that needs it. Slot 0 is
/// never valid because builtin numbers come from negated statement indices.
#[derive(Clone, Debug, Default)]
pub struct Builtins {
    table: Vec<Option<Builtin>>,
}

impl Builtins {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `func` as builtin number `index`, replacing any previous one.
    pub fn register(&mut self, index: u32, name: &'static str, func: BuiltinFn) -> &mut Self {
        let index = index as usize;
        if self.table.len() <= index {
            self.table.resize(index + 1, None);
        }
        self.table[index] = Some(Builtin { name, func });
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, index: u32, name: &'static str, func: BuiltinFn) -> Self {
        self.register(index, name, func);
        self
    }

    /// Looks up a builtin.
    ///
    /// # Errors
    ///
    /// Returns `BadBuiltin` if `index` is out of range or unregistered.
    pub fn get(&self, index: u32) -> Result<Builtin> {
        self.table
            .get(index as usize)
            .copied()
            .flatten()
            .ok_or_else(|| Error::new(ErrorKind::BadBuiltin(index)))
    }

    /// Number of slots, registered or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if no slots exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Registered builtins with their numbers.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Builtin)> + '_ {
        self.table
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_ref().map(|b| (i as u32, b)))
    }
}

// =============================================================================
// Host accessors
// =============================================================================

/// Parameter and return slot access for builtins.
///
/// Parameter numbers run from 0 to 7; larger numbers panic, as they can only
/// come from a miswritten builtin.
impl Vm {
    /// Number of arguments the current call passed.
    #[must_use]
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Reads parameter `n` as a float.
    #[must_use]
    pub fn get_float(&self, n: usize) -> f32 {
        self.globals.float(ofs::parm(n))
    }

    /// Reads parameter `n` as an integer.
    #[must_use]
    pub fn get_int(&self, n: usize) -> i32 {
        self.globals.int(ofs::parm(n))
    }

    /// Reads parameter `n` as a vector.
    #[must_use]
    pub fn get_vector(&self, n: usize) -> Vec3 {
        self.globals.vector(ofs::parm(n))
    }

    /// Reads parameter `n` as a string id.
    #[must_use]
    pub fn get_string_id(&self, n: usize) -> StringId {
        self.globals.string(ofs::parm(n))
    }

    /// Reads parameter `n` as string contents.
    #[must_use]
    pub fn get_string(&self, n: usize) -> &str {
        self.strings.resolve(self.get_string_id(n))
    }

    /// Reads parameter `n` as an entity.
    #[must_use]
    pub fn get_entity(&self, n: usize) -> EntityIndex {
        self.globals.entity(ofs::parm(n))
    }

    /// Reads parameter `n` as a function reference.
    #[must_use]
    pub fn get_function(&self, n: usize) -> FunctionId {
        self.globals.function(ofs::parm(n))
    }

    /// Writes a float to the return slot.
    pub fn return_float(&mut self, value: f32) {
        self.globals.set_float(OFS_RETURN, value);
    }

    /// Writes an integer to the return slot.
    pub fn return_int(&mut self, value: i32) {
        self.globals.set_int(OFS_RETURN, value);
    }

    /// Writes a vector to the return slot.
    pub fn return_vector(&mut self, value: Vec3) {
        self.globals.set_vector(OFS_RETURN, value);
    }

    /// Writes an entity to the return slot.
    pub fn return_entity(&mut self, entity: EntityIndex) {
        self.globals.set_entity(OFS_RETURN, entity);
    }

    /// Writes a string id to the return slot.
    pub fn return_string_id(&mut self, id: StringId) {
        self.globals.set(OFS_RETURN, Cell::from_string(id));
    }

    /// Writes `s` to a temporary string slot and returns it.
    pub fn return_string(&mut self, s: &str) {
        let id = self.temp_string(s);
        self.return_string_id(id);
    }

    /// Interns a string that lives as long as the program.
    ///
    /// Every distinct string grows the pool for good. Builtin results should
    /// use [`temp_string`](Self::temp_string) instead.
    pub fn set_string(&mut self, s: &str) -> StringId {
        self.strings.intern(s)
    }

    /// Stores a short-lived string in the temporary ring.
    pub fn temp_string(&mut self, s: &str) -> StringId {
        self.strings.temp(s)
    }

    /// Allocates an entity record at the current program time.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded(Edicts)` if the table is exhausted.
    pub fn allocate_entity(&mut self) -> Result<EntityIndex> {
        let now = self.time();
        self.entities.allocate(now)
    }

    /// Frees an entity record at the current program time.
    ///
    /// # Errors
    ///
    /// Returns `ReservedEntity` or `BadEntity` for records that cannot be freed.
    pub fn free_entity(&mut self, entity: EntityIndex) -> Result<()> {
        let now = self.time();
        self.entities.free(entity, now, &mut *self.spatial)
    }

    /// Appends a line to the output buffer and logs it.
    pub fn print(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(target: "progsvm::print", "{}", text.trim_end());
        self.output.push(text);
    }
}

//! The program string pool.
//!
//! Strings live back to back in one buffer, each terminated by a NUL byte.
//! A [`StringId`] is a byte offset into that buffer, so an id may point into
//! the middle of a stored string and still name a valid (suffix) string.
//! Offset 0 always holds the empty string.
//!
//! Strings built by builtins at run time go into a fixed ring of temporary
//! slots instead of being interned, so the pool stops growing once the ring
//! exists. A temporary string stays valid until [`TEMP_SLOTS`] more have been
//! made.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of temporary string slots.
pub const TEMP_SLOTS: usize = 16;

/// Bytes per temporary slot, terminator included.
pub const TEMP_SLOT_SIZE: usize = 128;

/// Byte offset of a string in a [`StringTable`].
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StringId(u32);

impl StringId {
    /// The null string id (offset 0, the empty string).
    pub const NULL: StringId = StringId(0);

    /// Creates a string id from a byte offset.
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    /// Returns the byte offset.
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.0
    }

    /// Returns true for the null id.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Interned, NUL-separated string pool.
///
/// Interning the same text twice returns the same id. It is not
/// thread-safe; the engine owning it is single-threaded.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StringTable {
    /// Concatenated strings, each followed by `\0`.
    data: String,
    /// Map from string contents to the offset of their first copy.
    /// Temporary slots are never indexed.
    #[cfg_attr(feature = "serde", serde(skip))]
    index: HashMap<Box<str>, StringId>,
    /// Offset of the temporary ring, once one has been made.
    temp_base: Option<u32>,
    /// Slot the next temporary string is written to.
    next_temp: usize,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// Creates a table holding only the empty string at offset 0.
    #[must_use]
    pub fn new() -> Self {
        let mut index = HashMap::new();
        index.insert("".into(), StringId::NULL);
        Self {
            data: String::from("\0"),
            index,
            temp_base: None,
            next_temp: 0,
        }
    }

    /// Builds a table from a raw NUL-separated blob, as produced by a compiler.
    ///
    /// A leading `\0` is inserted when the blob does not start with one so
    /// offset 0 stays the empty string.
    #[must_use]
    pub fn from_blob(blob: &str) -> Self {
        let mut data = String::with_capacity(blob.len() + 2);
        if !blob.starts_with('\0') {
            data.push('\0');
        }
        data.push_str(blob);
        if !data.ends_with('\0') {
            data.push('\0');
        }

        let mut table = Self {
            data,
            index: HashMap::new(),
            temp_base: None,
            next_temp: 0,
        };
        table.reindex();
        table
    }

    /// Indexes every string stored in `data[start..end]`.
    fn index_range(&mut self, start: usize, end: usize) {
        let Some(region) = self.data.get(start..end) else {
            return;
        };
        let mut offset = start;
        for piece in region.split('\0') {
            if let Ok(off) = u32::try_from(offset) {
                self.index.entry(piece.into()).or_insert(StringId(off));
            }
            offset += piece.len() + 1;
        }
    }

    /// Interns a string, returning its id.
    ///
    /// Interior NUL bytes truncate the stored string at the first NUL.
    ///
    /// # Panics
    ///
    /// Panics if the pool grows past `u32::MAX` bytes.
    pub fn intern(&mut self, s: &str) -> StringId {
        let s = s.split('\0').next().unwrap_or("");
        if let Some(&id) = self.index.get(s) {
            return id;
        }

        let id = StringId(u32::try_from(self.data.len()).expect("string pool overflow"));
        self.data.push_str(s);
        self.data.push('\0');
        self.index.insert(s.into(), id);
        id
    }

    /// Resolves an id to its contents.
    ///
    /// Returns `None` if the offset is past the end of the pool or does not
    /// fall on a character boundary.
    #[must_use]
    pub fn get(&self, id: StringId) -> Option<&str> {
        let tail = self.data.get(id.0 as usize..)?;
        Some(tail.split('\0').next().unwrap_or(""))
    }

    /// Resolves an id, treating unresolvable ids as the empty string.
    #[must_use]
    pub fn resolve(&self, id: StringId) -> &str {
        self.get(id).unwrap_or("")
    }

    /// Looks up the id of already-interned contents.
    #[must_use]
    pub fn lookup(&self, s: &str) -> Option<StringId> {
        self.index.get(s).copied()
    }

    /// Returns the pool size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if only the empty string is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// Rebuilds the lookup index after deserialization.
    pub fn reindex(&mut self) {
        self.index.clear();
        self.index.insert("".into(), StringId::NULL);
        let len = self.data.len();
        match self.temp_base {
            Some(base) => {
                let base = base as usize;
                self.index_range(0, base);
                self.index_range(base + TEMP_SLOTS * TEMP_SLOT_SIZE, len);
            }
            None => self.index_range(0, len),
        }
    }

    // =========================================================================
    // Temporary Strings
    // =========================================================================

    /// Stores a short-lived string in the next temporary slot.
    ///
    /// The text is cut at the first NUL and to `TEMP_SLOT_SIZE - 1` bytes.
    /// The slot is overwritten after [`TEMP_SLOTS`] more temporary strings.
    ///
    /// # Panics
    ///
    /// Panics if the pool grows past `u32::MAX` bytes.
    pub fn temp(&mut self, s: &str) -> StringId {
        let s = s.split('\0').next().unwrap_or("");
        if s.is_empty() {
            return StringId::NULL;
        }

        let base = if let Some(base) = self.temp_base {
            base as usize
        } else {
            let base = self.data.len();
            self.data
                .extend(std::iter::repeat_n('\0', TEMP_SLOTS * TEMP_SLOT_SIZE));
            self.temp_base = Some(u32::try_from(base).expect("string pool overflow"));
            base
        };

        let mut end = s.len().min(TEMP_SLOT_SIZE - 1);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut slot = String::with_capacity(TEMP_SLOT_SIZE);
        slot.push_str(&s[..end]);
        slot.extend(std::iter::repeat_n('\0', TEMP_SLOT_SIZE - end));

        let start = base + self.next_temp * TEMP_SLOT_SIZE;
        self.data.replace_range(start..start + TEMP_SLOT_SIZE, &slot);
        self.next_temp = (self.next_temp + 1) % TEMP_SLOTS;
        StringId(u32::try_from(start).expect("string pool overflow"))
    }

    /// Returns true if `id` points into the temporary ring.
    #[must_use]
    pub fn is_temp(&self, id: StringId) -> bool {
        self.temp_base.is_some_and(|base| {
            let offset = id.0 as usize;
            let base = base as usize;
            offset >= base && offset < base + TEMP_SLOTS * TEMP_SLOT_SIZE
        })
    }
}

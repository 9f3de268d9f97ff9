//! Session snapshots using `MessagePack`.
//!
//! A snapshot holds everything a running program can change: the global
//! segment, the entity table, the string pool (runtime strings included),
//! and the session clock. The program image itself is not saved; a snapshot
//! is restored against the same program it was taken from.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use progsvm_foundation::{Error, ErrorKind, Result, StringTable};
use progsvm_storage::{EntityTable, GlobalSegment};
use progsvm_vm::{Program, Vm};
use serde::{Deserialize, Serialize};

/// Mutable program state at one instant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Session clock.
    pub time: f32,
    /// Frames run so far.
    pub frame: u64,
    /// Every global cell.
    pub globals: GlobalSegment,
    /// Every entity record and its bookkeeping.
    pub entities: EntityTable,
    /// String pool, so string cells keep resolving.
    pub strings: StringTable,
}

impl Snapshot {
    /// Copies the state of an idle VM.
    #[must_use]
    pub fn capture(vm: &Vm, time: f32, frame: u64) -> Self {
        Self {
            time,
            frame,
            globals: vm.globals().clone(),
            entities: vm.entities().clone(),
            strings: vm.strings().clone(),
        }
    }

    /// Checks that the snapshot fits `program`.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the global segment or the entity
    /// record layout differs from what the program expects.
    pub fn check(&self, program: &Program) -> Result<()> {
        program.check_state(&self.globals, &self.entities)
    }
}

/// Serializes a snapshot to bytes using `MessagePack` format.
///
/// Uses named serialization to preserve struct field names.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(snapshot)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a snapshot from `MessagePack` bytes.
///
/// The string pool's lookup index is not serialized and is rebuilt here.
///
/// # Errors
///
/// Returns an error if deserialization fails.
pub fn from_bytes(bytes: &[u8]) -> Result<Snapshot> {
    let mut snapshot: Snapshot = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))?;
    snapshot.strings.reindex();
    Ok(snapshot)
}

/// Saves a snapshot to a file using `MessagePack` format.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to create file '{}': {e}",
            path.display()
        )))
    })?;

    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(snapshot)?;

    writer.write_all(&bytes).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to write to file '{}': {e}",
            path.display()
        )))
    })?;

    writer.flush().map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to flush file '{}': {e}",
            path.display()
        )))
    })?;

    Ok(())
}

/// Loads a snapshot from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to open file '{}': {e}",
            path.display()
        )))
    })?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();

    reader.read_to_end(&mut bytes).map_err(|e| {
        Error::new(ErrorKind::IoError(format!(
            "failed to read file '{}': {e}",
            path.display()
        )))
    })?;

    from_bytes(&bytes)
}

//! On-disk layout of a database directory.
//!
//! A database directory holds a single `record.db` file and, while a writer
//! has it open, a `db.lock` file. The record starts with a fixed header:
//!
//! ```text
//! magic  b"ENQD"
//! u32    format version (big-endian)
//! u32    CRC32 of the payload (big-endian)
//! u64    payload length (big-endian)
//! ...    bincode-encoded snapshot
//! ```
//!
//! Any failure to read or validate the record is reported as
//! [`EnquireError::DatabaseOpening`].

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocId, Document};
use crate::error::{EnquireError, Result};

/// File name of the snapshot record inside a database directory.
pub const RECORD_FILE: &str = "record.db";

/// File name of the writer lock inside a database directory.
pub const LOCK_FILE: &str = "db.lock";

const MAGIC: &[u8; 4] = b"ENQD";
const FORMAT_VERSION: u32 = 1;
const TEMP_SUFFIX: &str = ".tmp";

/// Everything needed to rebuild an index.
#[derive(Debug, Deserialize)]
pub(crate) struct Snapshot {
    pub uuid: Uuid,
    pub last_docid: DocId,
    pub documents: Vec<(DocId, Document)>,
}

#[derive(Serialize)]
pub(crate) struct SnapshotRef<'a> {
    pub uuid: Uuid,
    pub last_docid: DocId,
    pub documents: Vec<(DocId, &'a Document)>,
}

/// Path of the snapshot record for a database directory.
pub(crate) fn record_path(dir: &Path) -> PathBuf {
    dir.join(RECORD_FILE)
}

/// Whether `dir` looks like a database directory.
pub(crate) fn exists(dir: &Path) -> bool {
    record_path(dir).is_file()
}

/// Write a snapshot atomically: the record is written to a temporary file
/// and renamed over the old one.
pub(crate) fn write_snapshot(dir: &Path, snapshot: &SnapshotRef<'_>, sync: bool) -> Result<()> {
    let payload = bincode::serialize(snapshot)?;
    let checksum = crc32fast::hash(&payload);

    let target = record_path(dir);
    let temp = dir.join(format!("{RECORD_FILE}{TEMP_SUFFIX}"));

    {
        let file = File::create(&temp)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        writer.write_u32::<BigEndian>(FORMAT_VERSION)?;
        writer.write_u32::<BigEndian>(checksum)?;
        writer.write_u64::<BigEndian>(payload.len() as u64)?;
        writer.write_all(&payload)?;
        writer.flush()?;

        if sync {
            writer.get_ref().sync_all()?;
        }
    }

    std::fs::rename(&temp, &target)?;
    log::debug!(
        "Wrote {} documents to {}",
        snapshot.documents.len(),
        target.display()
    );
    Ok(())
}

/// Read and validate the snapshot stored in `dir`.
pub(crate) fn read_snapshot(dir: &Path) -> Result<Snapshot> {
    let path = record_path(dir);
    let opening = |reason: String| {
        EnquireError::database_opening(format!("{}: {reason}", dir.display()))
    };

    if !dir.is_dir() {
        return Err(opening("not a database directory".to_string()));
    }

    let mut file = File::open(&path).map_err(|e| opening(format!("cannot open record: {e}")))?;

    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)
        .map_err(|e| opening(format!("truncated header: {e}")))?;
    if &magic != MAGIC {
        return Err(opening("bad magic".to_string()));
    }

    let version = file
        .read_u32::<BigEndian>()
        .map_err(|e| opening(format!("truncated header: {e}")))?;
    if version != FORMAT_VERSION {
        return Err(opening(format!("unsupported format version {version}")));
    }

    let checksum = file
        .read_u32::<BigEndian>()
        .map_err(|e| opening(format!("truncated header: {e}")))?;
    let length = file
        .read_u64::<BigEndian>()
        .map_err(|e| opening(format!("truncated header: {e}")))?;

    let mut payload = Vec::new();
    file.read_to_end(&mut payload)
        .map_err(|e| opening(format!("cannot read payload: {e}")))?;
    if payload.len() as u64 != length {
        return Err(opening(format!(
            "payload is {} bytes, header says {length}",
            payload.len()
        )));
    }
    if crc32fast::hash(&payload) != checksum {
        return Err(opening("checksum mismatch".to_string()));
    }

    bincode::deserialize(&payload).map_err(|e| opening(format!("undecodable snapshot: {e}")))
}

/// An exclusive advisory lock on a database directory, held for the
/// lifetime of a writer.
#[derive(Debug)]
pub(crate) struct DirLock {
    path: PathBuf,
    file: File,
    released: bool,
}

impl DirLock {
    /// Take the lock, failing with [`EnquireError::DatabaseLock`] if another
    /// writer holds it.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive().map_err(|e| {
            EnquireError::database_lock(format!("{} is locked: {e}", dir.display()))
        })?;

        log::debug!("Acquired lock {}", path.display());
        Ok(DirLock {
            path,
            file,
            released: false,
        })
    }

    /// Release the lock. Calling this more than once is harmless.
    pub fn release(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            FileExt::unlock(&self.file)?;
            log::debug!("Released lock {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release lock {}: {e}", self.path.display());
        }
    }
}

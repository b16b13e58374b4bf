//! WAYBILL - Write-Ahead Log (WAL)
//! Provides durability by logging every ledger version to disk
//! before it is applied to the in-memory version index.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::types::{Key, Value, Version};

use super::index::VersionIndex;

const LEN_BYTES: usize = 4;
const CRC_BYTES: usize = 4;

/// Smallest bincode `WalRecord`: three u64 length/timestamp fields and the
/// `Option` tag.
const MIN_PAYLOAD_BYTES: usize = 8 + 8 + 8 + 1;
/// Largest payload a frame may declare.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// The file operations an append relies on.
trait FrameSink {
    fn end(&mut self) -> io::Result<u64>;
    fn write_frame(&mut self, frame: &[u8], sync: bool) -> io::Result<()>;
    fn truncate(&mut self, len: u64, sync: bool) -> io::Result<()>;
}

impl FrameSink for File {
    fn end(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn write_frame(&mut self, frame: &[u8], sync: bool) -> io::Result<()> {
        self.write_all(frame)?;
        if sync {
            self.sync_all()?;
        }
        Ok(())
    }

    fn truncate(&mut self, len: u64, sync: bool) -> io::Result<()> {
        self.set_len(len)?;
        if sync {
            self.sync_all()?;
        }
        Ok(())
    }
}

/// Why an append failed, and whether the file is back where it started.
#[derive(Debug)]
enum AppendFailure {
    RolledBack(io::Error),
    Stuck { write: io::Error, rollback: io::Error },
}

/// Write `frame` at the end of `sink`. On any error the sink is cut back to
/// its previous length so no partial or unacknowledged frame survives.
fn append_frame<S: FrameSink>(sink: &mut S, frame: &[u8], sync: bool) -> Result<(), AppendFailure> {
    let start = sink.end().map_err(AppendFailure::RolledBack)?;
    match sink.write_frame(frame, sync) {
        Ok(()) => Ok(()),
        Err(write) => match sink.truncate(start, sync) {
            Ok(()) => Err(AppendFailure::RolledBack(write)),
            Err(rollback) => Err(AppendFailure::Stuck { write, rollback }),
        },
    }
}

/// Length of the valid frame starting at `data[0]`, if there is one.
fn valid_frame(data: &[u8]) -> Option<usize> {
    let len = declared_len(data)?;
    if !(MIN_PAYLOAD_BYTES..=MAX_PAYLOAD_BYTES).contains(&len) {
        return None;
    }
    let frame_len = LEN_BYTES + len + CRC_BYTES;
    if data.len() < frame_len {
        return None;
    }
    let mut crc_bytes = [0u8; CRC_BYTES];
    crc_bytes.copy_from_slice(&data[LEN_BYTES + len..frame_len]);
    (crc32fast::hash(&data[..LEN_BYTES + len]) == u32::from_le_bytes(crc_bytes)).then_some(frame_len)
}

fn declared_len(data: &[u8]) -> Option<usize> {
    let mut len_bytes = [0u8; LEN_BYTES];
    len_bytes.copy_from_slice(data.get(..LEN_BYTES)?);
    Some(u32::from_le_bytes(len_bytes) as usize)
}

/// Payload of one WAL frame.
#[derive(Debug, Serialize, Deserialize)]
struct WalRecord {
    tx_id: String,
    timestamp: u64,
    key: Key,
    value: Option<Value>,
}

/// What [`WriteAheadLog::recover`] rebuilt from disk.
pub struct Recovered {
    pub index: VersionIndex,
    /// Number of complete frames replayed.
    pub frames: usize,
    /// Bytes dropped from a torn final frame.
    pub truncated_bytes: u64,
}

/// Write-Ahead Log for crash recovery and durability.
///
/// ## Binary Format (per frame)
/// ```text
/// [len: 4 bytes (LE)][payload: len bytes (bincode WalRecord)][crc: 4 bytes (LE), over len + payload]
/// ```
pub struct WriteAheadLog {
    /// Path to the WAL file on disk.
    path: PathBuf,
    /// File handle opened for appending.
    file: File,
    /// fsync after every append.
    sync_writes: bool,
    /// Set when a failed append could not be rolled back; no further
    /// appends are accepted.
    poisoned: bool,
}

impl WriteAheadLog {
    /// Open or create a WAL file at the specified path.
    pub fn open(path: PathBuf, sync_writes: bool) -> LedgerResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            sync_writes,
            poisoned: false,
        })
    }

    /// Encode one version of `key` into a framed, checksummed WAL entry.
    fn encode_frame(key: &[u8], version: &Version) -> LedgerResult<Vec<u8>> {
        let record = WalRecord {
            tx_id: version.tx_id.clone(),
            timestamp: version.timestamp,
            key: key.to_vec(),
            value: version.value.clone(),
        };
        let payload = bincode::serialize(&record)?;
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(LedgerError::Serialization(format!(
                "WAL payload of {} bytes exceeds {} byte limit",
                payload.len(),
                MAX_PAYLOAD_BYTES
            )));
        }
        let len = payload.len() as u32;

        let mut buf = Vec::with_capacity(LEN_BYTES + payload.len() + CRC_BYTES);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&payload);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Append one version to the WAL, flushing to disk when configured.
    /// The write is persisted before the index is updated in memory.
    ///
    /// A failed append leaves the file as it was. If that cannot be
    /// guaranteed the log is poisoned and every later append fails with
    /// [`LedgerError::Unavailable`].
    pub fn append(&mut self, key: &[u8], version: &Version) -> LedgerResult<()> {
        if self.poisoned {
            return Err(LedgerError::Unavailable(format!(
                "WAL {:?} holds an unrecoverable partial write",
                self.path
            )));
        }
        let encoded = Self::encode_frame(key, version)?;
        match append_frame(&mut self.file, &encoded, self.sync_writes) {
            Ok(()) => Ok(()),
            Err(AppendFailure::RolledBack(err)) => Err(err.into()),
            Err(AppendFailure::Stuck { write, rollback }) => {
                self.poisoned = true;
                log::error!(
                    "WAL {:?}: append failed ({}) and rollback failed ({}); refusing writes",
                    self.path,
                    write,
                    rollback
                );
                Err(write.into())
            }
        }
    }

    /// Replay the WAL at `path` into a fresh index.
    ///
    /// Only a torn final frame is truncated away: a partial length header, or
    /// a plausible length whose frame runs past end of file with no valid
    /// frame after it. Anything else (a bad CRC, an impossible length, a
    /// short frame followed by intact ones) fails with
    /// [`LedgerError::Corruption`] and leaves the file untouched.
    pub fn recover(path: &Path) -> LedgerResult<Recovered> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let mut index = VersionIndex::new();
        let mut frames = 0;
        let mut offset = 0;

        while offset < data.len() {
            let rest = &data[offset..];
            let Some(len) = declared_len(rest) else {
                break;
            };
            if !(MIN_PAYLOAD_BYTES..=MAX_PAYLOAD_BYTES).contains(&len) {
                return Err(LedgerError::Corruption(format!(
                    "WAL frame at offset {} declares impossible length {}",
                    offset, len
                )));
            }

            let frame_len = LEN_BYTES + len + CRC_BYTES;
            if rest.len() < frame_len {
                if let Some(later) = (1..rest.len()).find(|&i| valid_frame(&rest[i..]).is_some()) {
                    return Err(LedgerError::Corruption(format!(
                        "WAL frame at offset {} overruns the intact frame at offset {}",
                        offset,
                        offset + later
                    )));
                }
                break;
            }
            if valid_frame(rest).is_none() {
                return Err(LedgerError::Corruption(format!(
                    "WAL frame at offset {} failed CRC check",
                    offset
                )));
            }

            let record: WalRecord = bincode::deserialize(&rest[LEN_BYTES..LEN_BYTES + len])?;
            index.append(
                record.key,
                Version {
                    tx_id: record.tx_id,
                    timestamp: record.timestamp,
                    value: record.value,
                },
            );
            frames += 1;
            offset += frame_len;
        }

        let truncated_bytes = (data.len() - offset) as u64;
        if truncated_bytes > 0 {
            log::warn!(
                "WAL {:?}: dropping {} bytes of torn frame at offset {}",
                path,
                truncated_bytes,
                offset
            );
            OpenOptions::new()
                .write(true)
                .open(path)?
                .set_len(offset as u64)?;
        }

        Ok(Recovered {
            index,
            frames,
            truncated_bytes,
        })
    }
}

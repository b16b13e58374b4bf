//! WAYBILL - Journal Configuration
//! Defines tunable parameters for the ledger journal.

use std::path::PathBuf;

/// Environment variable naming the data directory.
pub const ENV_DATA_DIR: &str = "WAYBILL_DATA_DIR";
/// Environment variable toggling fsync on every WAL append.
pub const ENV_SYNC_WRITES: &str = "WAYBILL_SYNC_WRITES";

/// Configuration for the waybill journal.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for the write-ahead log.
    pub data_dir: PathBuf,

    /// Whether to sync WAL writes to disk immediately (fsync).
    pub sync_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
        }
    }
}

impl Config {
    /// Create a new Config with a custom data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Build a Config from `WAYBILL_DATA_DIR` and `WAYBILL_SYNC_WRITES`,
    /// falling back to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let sync_writes = lookup(ENV_SYNC_WRITES)
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or(defaults.sync_writes);
        Self {
            data_dir,
            sync_writes,
        }
    }

    /// Set whether WAL appends are fsynced.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// The same settings for the journal holding one record kind, placed in
    /// its own subdirectory so kinds never share a key space.
    pub fn for_kind(&self, kind: &str) -> Self {
        Self {
            data_dir: self.data_dir.join(kind),
            ..self.clone()
        }
    }

    /// Path to the journal's write-ahead log.
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("waybill.wal")
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
